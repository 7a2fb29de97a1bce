//! Bailiff stage progression
//!
//! Stages advance one way only. The finance handoff is not part of the
//! linear successor chain; it is a separate guarded transition reachable
//! from any stage (see [`crate::progression`]).

#[derive(
    minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum Stage {
    #[n(0)]
    EnAttenteDocuments,
    #[n(1)]
    EnActions,
    #[n(2)]
    EnAudiences,
    #[n(3)]
    HandedToFinance,
}

impl Stage {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Stage::EnAttenteDocuments => "EN_ATTENTE_DOCUMENTS",
            Stage::EnActions => "EN_ACTIONS",
            Stage::EnAudiences => "EN_AUDIENCES",
            Stage::HandedToFinance => "HANDED_TO_FINANCE",
        }
    }
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "EN_ATTENTE_DOCUMENTS" => Some(Stage::EnAttenteDocuments),
            "EN_ACTIONS" => Some(Stage::EnActions),
            "EN_AUDIENCES" => Some(Stage::EnAudiences),
            "HANDED_TO_FINANCE" => Some(Stage::HandedToFinance),
            _ => None,
        }
    }
    /// Next stage on the linear path, if any
    pub fn successor(&self) -> Option<Stage> {
        match self {
            Stage::EnAttenteDocuments => Some(Stage::EnActions),
            Stage::EnActions => Some(Stage::EnAudiences),
            Stage::EnAudiences | Stage::HandedToFinance => None,
        }
    }
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::HandedToFinance)
    }
}
