//! Default analyzer rules.

pub mod resolve_columns;
pub mod resolve_create_select;
pub mod resolve_star;
pub mod resolve_tables;
pub mod resolve_views;
pub mod track_process;
pub mod validate_resolved;

use resolve_columns::ResolveColumns;
use resolve_create_select::ResolveCreateSelect;
use resolve_star::ResolveStar;
use resolve_tables::ResolveTables;
use resolve_views::ResolveViews;
use track_process::TrackProcess;
use validate_resolved::ValidateResolved;

use super::AnalyzerRule;

/// Rules run once, before the main resolution batch.
pub fn once_before() -> Vec<Box<dyn AnalyzerRule>> {
    vec![Box::new(ResolveViews), Box::new(ResolveCreateSelect)]
}

/// Rules run to a fixpoint.
pub fn default_rules() -> Vec<Box<dyn AnalyzerRule>> {
    vec![
        Box::new(ResolveTables),
        Box::new(ResolveStar),
        Box::new(ResolveColumns),
    ]
}

pub fn once_after() -> Vec<Box<dyn AnalyzerRule>> {
    vec![Box::new(TrackProcess)]
}

pub fn validation() -> Vec<Box<dyn AnalyzerRule>> {
    vec![Box::new(ValidateResolved)]
}
