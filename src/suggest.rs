use crate::infer::ColumnClassification;
use crate::ChartKind;

/// Derive plausible chart types from a column classification.
///
/// Rules are applied independently and unioned, first-insertion order,
/// duplicates removed:
/// - a categorical and a numeric column → bar, pie
/// - (a temporal or categorical column) and a numeric column → line
///
/// Two numeric columns alone suggest nothing (a scatter type is reserved
/// for later). An empty classification yields an empty list, which is a
/// valid result rather than an error.
pub fn suggest(analysis: &ColumnClassification) -> Vec<ChartKind> {
    let has_numeric = !analysis.numeric_columns.is_empty();
    let has_category = !analysis.category_columns.is_empty();
    let has_time = !analysis.time_columns.is_empty();

    let mut suggestions: Vec<ChartKind> = Vec::new();

    if has_category && has_numeric {
        push_unique(&mut suggestions, ChartKind::Bar);
        push_unique(&mut suggestions, ChartKind::Pie);
    }
    if (has_time || has_category) && has_numeric {
        push_unique(&mut suggestions, ChartKind::Line);
    }

    suggestions
}

fn push_unique(suggestions: &mut Vec<ChartKind>, kind: ChartKind) {
    if !suggestions.contains(&kind) {
        suggestions.push(kind);
    }
}
