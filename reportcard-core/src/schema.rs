//! OpenAPI description of the JSON data model.

use utoipa::OpenApi;

use crate::domain::{
    ChecksResult, FileSummary, Grade, Issue, LeaderboardEntry, RecentView, Score,
};
use crate::service::EvaluationRecord;

/// OpenAPI document listing every serialized type.
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            Issue,
            FileSummary,
            Score,
            Grade,
            ChecksResult,
            LeaderboardEntry,
            RecentView,
            EvaluationRecord
        )
    ),
    info(title = "Report Card", description = "Graded code quality results.")
)]
pub struct ApiDoc;

/// The component schemas as pretty-printed JSON.
pub fn schema_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

#[cfg(test)]
mod tests {
    use super::schema_json;

    #[test]
    fn schema_lists_data_model() {
        let json = schema_json().expect("schema");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        let schemas = &parsed["components"]["schemas"];
        for name in [
            "Issue",
            "FileSummary",
            "Score",
            "Grade",
            "ChecksResult",
            "LeaderboardEntry",
            "RecentView",
            "EvaluationRecord",
        ] {
            assert!(schemas.get(name).is_some(), "missing schema {name}");
        }
        assert!(schemas["FileSummary"]["properties"].get("fileURL").is_some());
    }
}
