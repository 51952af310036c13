//! Selection pipeline
//!
//! Resolve arguments, fetch, optionally sort, filter, and hand each match to
//! a callback. When totals are requested the matches are summed and the
//! finished total is returned alongside the match count.

use std::cmp::Ordering;

use tracing::debug;

use crate::TrpcError;
use crate::filter::{Filter, FilterOptions};
use crate::resolve::{PathLookup, UnmatchedPolicy, resolve_args};
use crate::rpc::{RpcClient, Torrent};
use crate::torrent::{self, Derived, Deriver, Total};

/// Fields every derived record is computed from
pub const DERIVE_FIELDS: [&str; 15] = [
    "id",
    "name",
    "error",
    "sizeWhenDone",
    "leftUntilDone",
    "rateUpload",
    "rateDownload",
    "uploadedEver",
    "recheckProgress",
    "bandwidthPriority",
    "status",
    "eta",
    "addedDate",
    "doneDate",
    "trackers",
];

/// Field a batch can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Age,
    Have,
    #[default]
    Id,
    Name,
    Progress,
    Ratio,
    Size,
    Uploaded,
}

impl SortField {
    /// Names accepted by [`SortField::parse`]
    pub const NAMES: [&str; 8] = ["age", "have", "id", "name", "progress", "ratio", "size", "uploaded"];

    /// Parse a field name; anything unrecognised sorts by id
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "age" => Self::Age,
            "have" => Self::Have,
            "name" => Self::Name,
            "progress" => Self::Progress,
            "ratio" => Self::Ratio,
            "size" => Self::Size,
            "uploaded" => Self::Uploaded,
            "id" => Self::Id,
            other => {
                debug!(field = other, "unknown sort field, sorting by id");
                Self::Id
            }
        }
    }
}

/// Sort order for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub reverse: bool,
}

impl Sort {
    #[must_use]
    pub const fn new(field: SortField, reverse: bool) -> Self {
        Self { field, reverse }
    }
}

fn compare(a: &Torrent, b: &Torrent, field: SortField, deriver: &Deriver<'_>, now: i64) -> Ordering {
    // NaN sorts after every number
    let float = |x: f64, y: f64| {
        x.partial_cmp(&y)
            .unwrap_or_else(|| x.is_nan().cmp(&y.is_nan()))
    };
    match field {
        SortField::Age => torrent::age(a.added_date, a.done_date, now)
            .cmp(&torrent::age(b.added_date, b.done_date, now)),
        SortField::Have => torrent::have(a.size_when_done, a.left_until_done)
            .cmp(&torrent::have(b.size_when_done, b.left_until_done)),
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Progress => {
            let zero = deriver.zero_size();
            float(
                torrent::progress(a.size_when_done, a.left_until_done, a.recheck_progress, zero),
                torrent::progress(b.size_when_done, b.left_until_done, b.recheck_progress, zero),
            )
        }
        SortField::Ratio => float(
            torrent::ratio(a.uploaded_ever, a.size_when_done),
            torrent::ratio(b.uploaded_ever, b.size_when_done),
        ),
        SortField::Size => a.size_when_done.cmp(&b.size_when_done),
        SortField::Uploaded => a.uploaded_ever.cmp(&b.uploaded_ever),
    }
}

/// Stable sort of a fetched batch
///
/// Reversing swaps the operands of each comparison, so equal keys keep
/// their fetched order in both directions.
pub fn sort_torrents(torrents: &mut [Torrent], sort: Sort, deriver: &Deriver<'_>) {
    let now = deriver.now();
    torrents.sort_by(|a, b| {
        if sort.reverse {
            compare(b, a, sort.field, deriver, now)
        } else {
            compare(a, b, sort.field, deriver, now)
        }
    });
}

/// Everything one pipeline run needs besides the client
#[derive(Debug, Clone)]
pub struct Request {
    pub args: Vec<String>,
    pub filter: FilterOptions,
    pub fields: Vec<&'static str>,
    pub sort: Option<Sort>,
    pub policy: UnmatchedPolicy,
    pub lookup: PathLookup,
    pub totals: bool,
}

impl Request {
    /// A request for `args` that aborts on unresolved arguments
    #[must_use]
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            filter: FilterOptions::default(),
            fields: Vec::new(),
            sort: None,
            policy: UnmatchedPolicy::Abort,
            lookup: PathLookup::default(),
            totals: false,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterOptions) -> Self {
        self.filter = filter;
        self
    }

    /// Extra fields the callback reads
    #[must_use]
    pub fn fields(mut self, fields: &[&'static str]) -> Self {
        self.fields.extend_from_slice(fields);
        self
    }

    #[must_use]
    pub const fn sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub const fn policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn lookup(mut self, lookup: PathLookup) -> Self {
        self.lookup = lookup;
        self
    }

    #[must_use]
    pub const fn totals(mut self, totals: bool) -> Self {
        self.totals = totals;
        self
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Number of torrents handed to the callback
    pub matched: usize,
    /// The finished total, when totals were requested and something matched
    pub total: Option<Derived>,
}

/// Run the selection pipeline
///
/// Filters are compiled before anything is fetched. With no arguments every
/// torrent is fetched; with arguments that resolve to nothing the request's
/// [`UnmatchedPolicy`] decides between failing and fetching everything.
///
/// # Errors
///
/// Returns `TrpcError::Filter` for a broken filter, `TrpcError::Rpc` for
/// daemon failures, `TrpcError::Unresolved` when aborting on unmatched
/// arguments, and anything the callback returns.
pub fn process_torrents<C, F>(
    client: &C,
    request: &Request,
    deriver: &Deriver<'_>,
    mut each: F,
) -> Result<Outcome, TrpcError>
where
    C: RpcClient,
    F: FnMut(&Torrent, &Derived) -> Result<(), TrpcError>,
{
    let filter = Filter::new(&request.filter)?;
    let resolution = resolve_args(client, &request.args, request.lookup)?;

    if resolution.ids.is_empty() && !request.args.is_empty() {
        match request.policy {
            UnmatchedPolicy::Abort => return Err(TrpcError::Unresolved(resolution.unmatched)),
            UnmatchedPolicy::Ignore => debug!("nothing resolved, selecting every torrent"),
        }
    }

    let mut fields: Vec<&str> = DERIVE_FIELDS.to_vec();
    for &field in request.fields.iter().chain(filter.required_fields().iter()) {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    let ids = (!resolution.ids.is_empty()).then_some(resolution.ids.as_slice());
    let mut torrents = client.torrent_get(&fields, ids)?;
    debug!(fetched = torrents.len(), "fetched torrents");

    if let Some(sort) = request.sort {
        sort_torrents(&mut torrents, sort, deriver);
    }

    let mut total = request.totals.then(Total::new);
    let mut matched = 0;
    for torrent in &torrents {
        let derived = deriver.derive(torrent);
        if !filter.matches(torrent, &derived)? {
            continue;
        }
        each(torrent, &derived)?;
        matched += 1;
        if let Some(total) = total.as_mut() {
            total.merge(&derived);
        }
    }

    Ok(Outcome {
        matched,
        total: total
            .filter(|t| !t.is_empty())
            .map(|t| t.finalize(deriver.zero_size())),
    })
}
