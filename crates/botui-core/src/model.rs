//! The compiled, immutable page data model (spec §3).
//!
//! `PageDefinition` and `ComponentDefinition` are what the (out-of-scope) XML
//! parser is expected to emit. Nothing here is mutated after construction —
//! live, mutable state lives in `botui-elements`/`botui-runtime` instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One parsed element from a component's inner markup, used to resolve a
/// prop from "a child element of matching name" (MenuElement common
/// protocol, §4.4) and to recover inner text for `title` fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub children: Vec<ElementNode>,
    /// Concatenated text content directly under this node (not descendants').
    #[serde(default)]
    pub text: String,
}

impl ElementNode {
    pub fn child(&self, tag: &str) -> Option<&ElementNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a ElementNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Raw inner markup of this node, reconstructed for use as a prop
    /// template (child-element-as-prop-source case in §4.4).
    pub fn inner_template(&self) -> String {
        if !self.text.trim().is_empty() {
            return self.text.clone();
        }
        self.children.iter().map(|c| c.text.clone()).collect::<Vec<_>>().join("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VIfKind {
    If,
    ElseIf,
    Else,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VIf {
    pub kind: VIfKind,
    /// Absent only for `Else`.
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VFor {
    pub item_name: String,
    #[serde(default)]
    pub index_name: Option<String>,
    pub expression: String,
}

/// The three attribute-prefix families a component's markup can carry
/// (spec §4, §6): `name="static"`, `:name`/`v-bind:name`, `@name`/`v-on:name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttributeSets {
    #[serde(default)]
    pub statics: HashMap<String, String>,
    #[serde(default)]
    pub binds: HashMap<String, String>,
    #[serde(default)]
    pub events: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDefinition {
    pub tag_name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub element: ElementNode,
    /// Row grouping key for keyboard assembly; `None` until ComponentFactory
    /// assigns one (v-for iterations get `base_row_index + iteration index`).
    #[serde(default)]
    pub row_index: Option<usize>,
    /// Raw `hide` attribute/binding text, resolved like any other prop.
    #[serde(default)]
    pub hide: Option<String>,
    /// Raw `columns` attribute/binding text.
    #[serde(default)]
    pub columns: Option<String>,
    #[serde(default)]
    pub v_if: Option<VIf>,
    #[serde(default)]
    pub v_for: Option<VFor>,
    #[serde(default)]
    pub attrs: AttributeSets,
}

impl ComponentDefinition {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            id: None,
            element: ElementNode::default(),
            row_index: None,
            hide: None,
            columns: None,
            v_if: None,
            v_for: None,
            attrs: AttributeSets::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleSpec {
    pub content: String,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageCondition {
    pub condition: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageBody {
    Inline(String),
    Conditions(Vec<MessageCondition>),
    Resource(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSpec {
    pub body: MessageBody,
    #[serde(default)]
    pub md: bool,
    #[serde(default)]
    pub pre: bool,
    #[serde(default)]
    pub wallpaper_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Document,
    Audio,
    Video,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSpec {
    pub kind: MediaKind,
    pub src: String,
}

/// A standalone navigation-panel definition (spec §3 `navigate`), used when
/// a page wants prev/counter/next buttons without a bound Card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigateSpec {
    #[serde(default)]
    pub carousel: bool,
    #[serde(default)]
    pub hide_boundary: bool,
    #[serde(default)]
    pub boundary_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuDefinition {
    pub components: Vec<ComponentDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDefinition {
    pub id: String,
    #[serde(default)]
    pub title: Option<TitleSpec>,
    #[serde(default)]
    pub back_title: Option<String>,
    #[serde(default)]
    pub message: Option<MessageSpec>,
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,
    /// Explicit pages overriding auto-pagination; mutually exclusive in
    /// practice with a flat `components` list meant to be auto-paginated.
    #[serde(default)]
    pub menu_pages: Option<Vec<MenuDefinition>>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub vmodel: Option<String>,
    #[serde(default)]
    pub vmodel_props: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub media: Option<MediaSpec>,
    #[serde(default)]
    pub web_preview: bool,
    #[serde(default)]
    pub back_to_parent: bool,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub navigate: Option<NavigateSpec>,
}

impl PageDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            back_title: None,
            message: None,
            components: Vec::new(),
            menu_pages: None,
            script: None,
            vmodel: None,
            vmodel_props: None,
            media: None,
            web_preview: false,
            back_to_parent: false,
            max_items: None,
            max_rows: None,
            navigate: None,
        }
    }

    /// A page auto-paginates when it has no explicit `menuPages` and either
    /// limit is set (§4.5 Card/AutoCard, §4 directive expansion).
    pub fn uses_auto_pagination(&self) -> bool {
        self.menu_pages.is_none() && (self.max_items.is_some() || self.max_rows.is_some())
    }

    /// Whether this page's body is text-only (no `media`), used by the
    /// cross-format navigation check (§6, §7).
    pub fn is_text_format(&self) -> bool {
        self.media.is_none()
    }
}
