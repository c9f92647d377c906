//! Studio workspace: plugins, the tools they contribute, and who may see them.

use serde::Serialize;

use crate::config::CliConfig;
use crate::principal::{is_administrator, Principal};
use crate::schema::{schema_types, DocumentType};

pub const STUDIO_NAME: &str = "default";
pub const STUDIO_TITLE: &str = "Day One Content Operations";
pub const STRUCTURE_TOOL: &str = "structure";
pub const VISION_TOOL: &str = "vision";
pub const MEDIA_TOOL: &str = "media";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub name: String,
    pub title: String,
}

impl Tool {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DocumentView {
    Form,
    Component { id: String, title: String },
}

/// Views offered for a document of `schema_type` when it is opened.
pub fn default_document_views(schema_type: &str) -> Vec<DocumentView> {
    let mut views = vec![DocumentView::Form];
    if schema_type == crate::models::EVENT_TYPE {
        views.push(DocumentView::Component {
            id: "preview".to_string(),
            title: "Preview".to_string(),
        });
    }
    views
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureItem {
    pub id: String,
    pub title: String,
    pub views: Vec<DocumentView>,
}

/// Navigation pane: one list per document type.
pub fn structure(types: &[DocumentType]) -> Vec<StructureItem> {
    types
        .iter()
        .map(|doc_type| StructureItem {
            id: doc_type.name.to_string(),
            title: format!("{}s", doc_type.title),
            views: default_document_views(doc_type.name),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "plugin", rename_all = "camelCase")]
pub enum Plugin {
    Structure { items: Vec<StructureItem> },
    Vision,
    Media,
}

impl Plugin {
    pub fn tool(&self) -> Tool {
        match self {
            Plugin::Structure { .. } => Tool::new(STRUCTURE_TOOL, "Structure"),
            Plugin::Vision => Tool::new(VISION_TOOL, "Vision"),
            Plugin::Media => Tool::new(MEDIA_TOOL, "Media"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioConfig {
    pub name: &'static str,
    pub title: &'static str,
    pub project_id: String,
    pub dataset: String,
    pub plugins: Vec<Plugin>,
    pub schema_types: Vec<DocumentType>,
}

impl StudioConfig {
    pub fn new(cli: &CliConfig) -> Self {
        let types = schema_types();
        Self {
            name: STUDIO_NAME,
            title: STUDIO_TITLE,
            project_id: cli.api.project_id.clone(),
            dataset: cli.api.dataset.clone(),
            plugins: vec![
                Plugin::Structure {
                    items: structure(&types),
                },
                Plugin::Vision,
                Plugin::Media,
            ],
            schema_types: types,
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.plugins.iter().map(Plugin::tool).collect()
    }

    pub fn tools_for(&self, principal: Option<&Principal>) -> Vec<Tool> {
        visible_tools(self.tools(), principal)
    }
}

/// The query console is for administrators only; everything else passes through.
pub fn visible_tools(tools: Vec<Tool>, principal: Option<&Principal>) -> Vec<Tool> {
    if is_administrator(principal) {
        return tools;
    }
    tools
        .into_iter()
        .filter(|tool| tool.name != VISION_TOOL)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::ADMINISTRATOR;

    fn names(tools: &[Tool]) -> Vec<&str> {
        tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    #[test]
    fn vision_hidden_from_non_admins() {
        let studio = StudioConfig::new(&CliConfig::default());
        let editor = Principal::with_roles(["editor"]);

        assert_eq!(
            names(&studio.tools_for(Some(&editor))),
            vec![STRUCTURE_TOOL, MEDIA_TOOL]
        );
        assert_eq!(names(&studio.tools_for(None)), vec![STRUCTURE_TOOL, MEDIA_TOOL]);
    }

    #[test]
    fn admins_see_every_tool() {
        let studio = StudioConfig::new(&CliConfig::default());
        let admin = Principal::with_roles([ADMINISTRATOR]);
        assert_eq!(
            names(&studio.tools_for(Some(&admin))),
            vec![STRUCTURE_TOOL, VISION_TOOL, MEDIA_TOOL]
        );
    }

    #[test]
    fn other_tools_pass_through_untouched() {
        let tools = vec![Tool::new("custom", "Custom"), Tool::new(VISION_TOOL, "Vision")];
        assert_eq!(visible_tools(tools, None), vec![Tool::new("custom", "Custom")]);
    }

    #[test]
    fn studio_uses_cli_project() {
        let studio = StudioConfig::new(&CliConfig::default());
        assert_eq!(studio.title, STUDIO_TITLE);
        assert_eq!(studio.project_id, "mw7e9in4");
        assert_eq!(studio.dataset, "production");
    }

    #[test]
    fn events_open_with_preview_view() {
        let items = structure(&schema_types());
        assert_eq!(items[0].id, "event");
        assert_eq!(items[0].title, "Events");
        assert_eq!(
            items[0].views,
            vec![
                DocumentView::Form,
                DocumentView::Component {
                    id: "preview".to_string(),
                    title: "Preview".to_string(),
                }
            ]
        );
        assert_eq!(default_document_views("venue"), vec![DocumentView::Form]);
    }
}
