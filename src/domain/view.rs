use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    GatherRequirements,
    ReviewPlan,
    Execution,
    Report,
    History,
}

impl View {
    /// Views that render the active project and cannot be entered without one.
    pub fn requires_project(&self) -> bool {
        matches!(self, View::ReviewPlan | View::Execution | View::Report)
    }

    pub fn can_transition_to(&self, next: View) -> bool {
        // Explicit navigation home is always allowed.
        if next == View::Dashboard {
            return true;
        }
        matches!(
            (self, next),
            (View::Dashboard, View::GatherRequirements)
                | (View::Dashboard, View::History)
                | (View::GatherRequirements, View::ReviewPlan)
                | (View::ReviewPlan, View::Execution)
                | (View::Execution, View::Report)
                | (View::Report, View::Execution)
                | (View::History, View::ReviewPlan)
                | (View::History, View::Report)
        )
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Dashboard => "Dashboard",
            View::GatherRequirements => "GatherRequirements",
            View::ReviewPlan => "ReviewPlan",
            View::Execution => "Execution",
            View::Report => "Report",
            View::History => "History",
        };
        f.write_str(name)
    }
}
