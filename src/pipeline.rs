use crate::config::Config;
use crate::error::RenderError;
use crate::extract::StructureSource;
use crate::fallback::build_fallback_roadmap;
use crate::ir::Roadmap;
use crate::layout::plan_layout;
use crate::render::render_roadmap;
use std::path::PathBuf;

/// Asks `source` for a roadmap and substitutes the fallback on any
/// extraction failure, including an invalid extracted graph.
pub fn resolve_roadmap(text: &str, source: &dyn StructureSource) -> Roadmap {
    match source.extract(text) {
        Ok(roadmap) => {
            log::info!(
                "extracted roadmap {:?} with {} nodes",
                roadmap.title(),
                roadmap.nodes().len()
            );
            roadmap
        }
        Err(err) => build_fallback_roadmap(text, Some(&err.to_string())),
    }
}

/// Plans and renders a validated roadmap, returning the artifact path.
pub fn generate(roadmap: &Roadmap, config: &Config) -> Result<PathBuf, RenderError> {
    let plan = plan_layout(roadmap, &config.layout);
    log::info!(
        "rendering {:?} as {} ({:?} layout)",
        plan.title,
        config.render.format.extension(),
        plan.mode
    );
    render_roadmap(&plan, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::ExtractionError;
    use crate::extract::JsonResponseSource;
    use crate::fallback::FALLBACK_TITLE;

    struct Unreachable;

    impl StructureSource for Unreachable {
        fn extract(&self, _text: &str) -> Result<Roadmap, ExtractionError> {
            Err(ExtractionError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn invalid_extraction_falls_back_with_error_in_title() {
        let source = JsonResponseSource::new(
            r#"{"title": "T", "clusters": [{"id": "c1", "label": "P"}],
                "nodes": [{"id": "t1", "label": "T", "type": "task", "parent_cluster": "c2"}]}"#,
        );
        let roadmap = resolve_roadmap("paper text", &source);
        assert!(roadmap.title().starts_with(FALLBACK_TITLE));
        assert!(roadmap.title().contains("[Error: "));
        assert_eq!(roadmap.nodes().len(), 12);
    }

    #[test]
    fn unavailable_source_falls_back() {
        let roadmap = resolve_roadmap("paper text", &Unreachable);
        assert!(roadmap.title().contains("structure extracti"));
        assert_eq!(roadmap.clusters().len(), 3);
    }

    #[test]
    fn valid_extraction_is_kept() {
        let source = JsonResponseSource::new(
            r#"{"title": "Mine", "clusters": [{"id": "c1", "label": "P"}],
                "nodes": [{"id": "t1", "label": "T", "type": "task", "parent_cluster": "c1"}]}"#,
        );
        assert_eq!(resolve_roadmap("", &source).title(), "Mine");
    }

    #[test]
    fn generate_writes_dot_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.render.format = OutputFormat::Dot;
        config.render.output_prefix = dir.path().join("plan");
        let roadmap = build_fallback_roadmap("", None);
        let path = generate(&roadmap, &config).unwrap();
        let dot = std::fs::read_to_string(&path).unwrap();
        assert!(dot.contains("subgraph \"cluster_phase2\""));
        assert_eq!(path.extension().unwrap(), "dot");
    }
}
