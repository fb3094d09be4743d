use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Label of the controller (and of a relay speaking on its behalf).
pub const MASTER: &str = "MASTER";

/// Label of the auxiliary centerpiece device.
pub const CENTERPIECE: &str = "CENTERPIECE";

/// Number of arms in the standard hub topology.
pub const HUB_ARMS: u16 = 5;

/// Label of arm `n` (1-based): `ARM1`, `ARM2`, ...
pub fn arm_label(n: u16) -> String {
    format!("ARM{n}")
}

/// Identifies one link attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u16);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link {}", self.0)
    }
}

/// Fixed lookup between hop labels and links.
///
/// Several labels may share one link (every arm behind a single radio
/// bridge). A link may also carry its own label when the far end is itself
/// an addressable actor; strict-pair routing uses it as the sender label.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    by_label: HashMap<String, LinkId>,
    own_labels: BTreeMap<LinkId, String>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard hub: `MASTER`=0, `ARM1`..`ARM5`=1..5, `CENTERPIECE`=6.
    pub fn hub() -> Self {
        let mut table = Self::new().with_link(LinkId(0), MASTER);
        for n in 1..=HUB_ARMS {
            table = table.with_link(LinkId(n), arm_label(n));
        }
        table.with_link(LinkId(HUB_ARMS + 1), CENTERPIECE)
    }

    /// Register `id` as the link to the actor called `label`.
    pub fn with_link(mut self, id: LinkId, label: impl Into<String>) -> Self {
        let label = label.into();
        self.by_label.insert(label.clone(), id);
        self.own_labels.insert(id, label);
        self
    }

    /// Make `label` reachable through `id` without naming the link itself.
    pub fn with_route(mut self, label: impl Into<String>, id: LinkId) -> Self {
        self.by_label.insert(label.into(), id);
        self
    }

    pub fn link_for(&self, label: &str) -> Option<LinkId> {
        self.by_label.get(label).copied()
    }

    /// The label of the actor at the far end of `id`, if it has one.
    pub fn label_of(&self, id: LinkId) -> Option<&str> {
        self.own_labels.get(&id).map(String::as_str)
    }

    pub fn is_known(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    /// Every link referenced by the table, ascending.
    pub fn links(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self
            .by_label
            .values()
            .chain(self.own_labels.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
