use std::collections::HashMap;
use std::path::Path;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::Result;
use crate::models::DistanceRow;

/// Nautical miles assumed for any port pair missing from the table. Large on
/// purpose so that missing data makes a voyage look worse, not better.
pub const FALLBACK_DISTANCE_NM: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteDistance {
    SamePort,
    Known(f64),
    Fallback(f64),
}

impl RouteDistance {
    pub fn value(self) -> f64 {
        match self {
            RouteDistance::SamePort => 0.0,
            RouteDistance::Known(d) | RouteDistance::Fallback(d) => d,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, RouteDistance::Fallback(_))
    }
}

/// Undirected port-to-port distances, keyed case-insensitively.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    graph: UnGraph<String, f64>,
    node_indices: HashMap<String, NodeIndex>,
    fallback: f64,
}

impl Default for DistanceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::with_fallback(FALLBACK_DISTANCE_NM)
    }

    pub fn with_fallback(fallback: f64) -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            node_indices: HashMap::new(),
            fallback,
        }
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a DistanceRow>) -> Self {
        let mut table = Self::new();
        table.extend(rows);
        table
    }

    /// Reads distance rows from a `.csv` file with a header row, or from a
    /// JSON array for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

        let rows = if is_csv {
            read_csv_rows(path)?
        } else {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        };
        Ok(Self::from_rows(&rows))
    }

    /// Like [`DistanceTable::from_path`], but an unreadable file yields an
    /// empty table so every lookup resolves through the fallback.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(table) => {
                tracing::info!("Loaded {} routes from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                tracing::warn!(
                    "Distance table {} unavailable ({}); every route will use the {} nm fallback",
                    path.display(),
                    e,
                    FALLBACK_DISTANCE_NM
                );
                Self::new()
            }
        }
    }

    pub fn extend<'a>(&mut self, rows: impl IntoIterator<Item = &'a DistanceRow>) {
        for row in rows {
            self.add_route(&row.from, &row.to, row.distance);
        }
    }

    /// Returns false when the pair is already known or names a single port;
    /// the first row seen for a pair wins.
    pub fn add_route(&mut self, from: &str, to: &str, distance: f64) -> bool {
        let a = self.node(from);
        let b = self.node(to);
        if a == b {
            return false;
        }
        if self.graph.find_edge(a, b).is_some() {
            tracing::debug!("Ignoring duplicate route {} - {}", from, to);
            return false;
        }
        self.graph.add_edge(a, b, distance);
        true
    }

    fn node(&mut self, port: &str) -> NodeIndex {
        let key = port.to_lowercase();
        if let Some(idx) = self.node_indices.get(&key) {
            return *idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.node_indices.insert(key, idx);
        idx
    }

    pub fn lookup(&self, from: &str, to: &str) -> RouteDistance {
        let from_key = from.to_lowercase();
        let to_key = to.to_lowercase();
        if from_key == to_key {
            return RouteDistance::SamePort;
        }

        let edge = match (self.node_indices.get(&from_key), self.node_indices.get(&to_key)) {
            (Some(a), Some(b)) => self.graph.find_edge(*a, *b),
            _ => None,
        };

        match edge {
            Some(e) => RouteDistance::Known(self.graph[e]),
            None => {
                tracing::debug!("No distance for {} - {}, using fallback", from, to);
                RouteDistance::Fallback(self.fallback)
            }
        }
    }

    pub fn distance(&self, from: &str, to: &str) -> f64 {
        self.lookup(from, to).value()
    }

    pub fn fallback_distance(&self) -> f64 {
        self.fallback
    }

    /// Number of distinct routes.
    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<DistanceRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(from: &str, to: &str, distance: f64) -> DistanceRow {
        DistanceRow {
            from: from.to_string(),
            to: to.to_string(),
            distance,
        }
    }

    fn table() -> DistanceTable {
        DistanceTable::from_rows(&[
            row("Kamsar", "Qingdao", 11_000.0),
            row("Port Hedland", "Lianyungang", 3_600.0),
            row("Singapore", "Kamsar", 6_900.0),
        ])
    }

    #[test]
    fn same_port_is_zero_for_any_table() {
        let t = table();
        assert_eq!(t.distance("Qingdao", "Qingdao"), 0.0);
        assert_eq!(t.distance("QINGDAO", "qingdao"), 0.0);
        assert_eq!(DistanceTable::new().distance("Nowhere", "NOWHERE"), 0.0);
    }

    #[test]
    fn lookup_is_symmetric_and_case_insensitive() {
        let t = table();
        assert_eq!(t.distance("Kamsar", "Qingdao"), 11_000.0);
        assert_eq!(t.distance("Qingdao", "Kamsar"), 11_000.0);
        assert_eq!(t.distance("kamsar", "QINGDAO"), 11_000.0);
        assert_eq!(t.lookup("lianyungang", "port hedland"), RouteDistance::Known(3_600.0));
    }

    #[test]
    fn unknown_route_uses_fallback() {
        let t = table();
        assert_eq!(t.distance("Qingdao", "Rotterdam"), FALLBACK_DISTANCE_NM);
        assert_eq!(t.distance("Kamsar", "Lianyungang"), FALLBACK_DISTANCE_NM);
        assert!(t.lookup("Qingdao", "Rotterdam").is_fallback());
    }

    #[test]
    fn first_row_for_a_pair_wins() {
        let mut t = DistanceTable::new();
        assert!(t.add_route("Dampier", "Qingdao", 3_500.0));
        assert!(!t.add_route("qingdao", "DAMPIER", 9_999.0));
        assert!(!t.add_route("Dampier", "dampier", 12.0));
        assert_eq!(t.len(), 1);
        assert_eq!(t.distance("Dampier", "Qingdao"), 3_500.0);
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let t = DistanceTable::load_or_empty(Path::new("/definitely/not/here.json"));
        assert!(t.is_empty());
        assert_eq!(t.distance("Kamsar", "Qingdao"), FALLBACK_DISTANCE_NM);
    }
}
