//! Report synthesis: turns the scan model into two in-memory sheet
//! layouts, one per view. The layouts are pure data; `xlsx` applies the
//! actual workbook styling, so the row/column structure and the state
//! classification stay testable without touching the filesystem.

use crate::model::{Host, PortKey, ScanInfo};

pub const DIRECT_SHEET_NAME: &str = "Scan Results";
pub const TRANSPOSED_SHEET_NAME: &str = "Transposed View";

/// First data row (0-indexed) of each view; everything above is title,
/// metadata and headers.
pub const DIRECT_DATA_START: usize = 10;
pub const TRANSPOSED_DATA_START: usize = 7;

/// Visual category of a port-state cell. Every state string maps to
/// exactly one category; the config assigns each category a fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateCategory {
    Open,
    Closed,
    Filtered,
    Undefined,
    Default,
}

impl StateCategory {
    /// Classify a state string by substring containment, first match
    /// wins. Multi-word scanner vocabulary like "open|filtered" lands in
    /// the open category because "open" is checked first.
    pub fn classify(state: &str) -> Self {
        let state = state.to_lowercase();
        if state.contains("open") {
            StateCategory::Open
        } else if state.contains("closed") {
            StateCategory::Closed
        } else if state.contains("filtered") {
            StateCategory::Filtered
        } else if state.contains("undefined") {
            StateCategory::Undefined
        } else {
            StateCategory::Default
        }
    }
}

/// How a cell is rendered by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    /// Sheet title, bold and centered, merged across the sheet width.
    Title,
    /// Bold, centered header cell.
    Header,
    /// Bold row label (metadata labels, port triples, host identities).
    Label,
    /// Plain cell.
    Text,
    /// Port-state cell, filled per its category.
    State(StateCategory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub kind: CellKind,
}

impl Cell {
    fn new(text: impl Into<String>, kind: CellKind) -> Self {
        Self { text: text.into(), kind }
    }

    fn state(state: &str) -> Self {
        Cell::new(state, CellKind::State(StateCategory::classify(state)))
    }
}

/// One sheet of the report: a named grid of typed cells. Rows may have
/// different lengths; fully blank rows are empty vectors.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetLayout {
    /// Widest row of the grid, in cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Build both views against the shared canonical key template. Callers
/// skip this entirely for an empty host sequence.
pub fn synthesize(hosts: &[Host], info: &ScanInfo, keys: &[PortKey]) -> Vec<SheetLayout> {
    vec![direct_view(hosts, info, keys), transposed_view(hosts, info, keys)]
}

fn metadata_rows(info: &ScanInfo) -> Vec<Vec<Cell>> {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());
    vec![
        vec![
            Cell::new("Scan started:", CellKind::Label),
            Cell::new(field(&info.start_time), CellKind::Label),
        ],
        vec![
            Cell::new("Source host:", CellKind::Label),
            Cell::new(field(&info.source_host), CellKind::Label),
        ],
        vec![
            Cell::new("Command:", CellKind::Label),
            Cell::new(field(&info.command), CellKind::Label),
        ],
        vec![
            Cell::new("Hosts processed:", CellKind::Label),
            Cell::new(
                format!("{} of {}", info.hosts_up, info.total_ips),
                CellKind::Label,
            ),
        ],
    ]
}

/// Ports as rows, hosts as columns.
fn direct_view(hosts: &[Host], info: &ScanInfo, keys: &[PortKey]) -> SheetLayout {
    let mut rows = Vec::with_capacity(DIRECT_DATA_START + keys.len());

    rows.push(vec![Cell::new("Scan summary", CellKind::Title)]);
    rows.extend(metadata_rows(info));
    rows.push(Vec::new());

    let mut ip_row = vec![Cell::new("Hosts:", CellKind::Header)];
    let mut name_row = vec![Cell::new("Hostname:", CellKind::Header)];
    for host in hosts {
        ip_row.push(Cell::new(&host.ip, CellKind::Header));
        name_row.push(Cell::new(
            host.hostname.clone().unwrap_or_default(),
            CellKind::Header,
        ));
    }
    rows.push(ip_row);
    rows.push(name_row);
    rows.push(Vec::new());

    let mut group_row = vec![
        Cell::new("Ports", CellKind::Header),
        Cell::new("Protocol", CellKind::Header),
        Cell::new("Service", CellKind::Header),
    ];
    group_row.extend(hosts.iter().map(|_| Cell::new("", CellKind::Text)));
    rows.push(group_row);

    for key in keys {
        let mut row = vec![
            Cell::new(&key.port, CellKind::Label),
            Cell::new(&key.protocol, CellKind::Label),
            Cell::new(&key.service, CellKind::Label),
        ];
        row.extend(hosts.iter().map(|host| Cell::state(host.state_for(key))));
        rows.push(row);
    }

    SheetLayout {
        name: DIRECT_SHEET_NAME.to_string(),
        rows,
    }
}

/// Hosts as rows, ports as column pairs (state cell + service spacer).
fn transposed_view(hosts: &[Host], info: &ScanInfo, keys: &[PortKey]) -> SheetLayout {
    let mut rows = Vec::with_capacity(TRANSPOSED_DATA_START + hosts.len());

    rows.push(vec![Cell::new("Transposed view", CellKind::Title)]);
    rows.extend(metadata_rows(info));
    rows.push(Vec::new());

    let mut header = vec![
        Cell::new("IP", CellKind::Header),
        Cell::new("Hostname", CellKind::Header),
    ];
    for key in keys {
        header.push(Cell::new(key.port_proto_label(), CellKind::Header));
        header.push(Cell::new(&key.service, CellKind::Header));
    }
    rows.push(header);

    for host in hosts {
        let mut row = vec![
            Cell::new(&host.ip, CellKind::Label),
            Cell::new(host.hostname.clone().unwrap_or_default(), CellKind::Label),
        ];
        for key in keys {
            row.push(Cell::state(host.state_for(key)));
            row.push(Cell::new("", CellKind::Text));
        }
        rows.push(row);
    }

    SheetLayout {
        name: TRANSPOSED_SHEET_NAME.to_string(),
        rows,
    }
}
