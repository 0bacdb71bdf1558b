use serde::Deserialize;
use std::collections::BTreeMap;

pub type EntityId = u64;

/// One consistent read-only view of an application and everything it owns.
/// The persistence collaborator hands this over as a single JSON document;
/// generation never mutates it.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub application: Application,
    pub theme: Theme,

    #[serde(default)]
    pub screens: Vec<Screen>,

    #[serde(default)]
    pub widgets: Vec<Widget>,

    #[serde(default)]
    pub properties: Vec<WidgetProperty>,

    #[serde(default)]
    pub data_sources: Vec<DataSource>,

    #[serde(default)]
    pub data_source_fields: Vec<DataSourceField>,

    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl Snapshot {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn screen(&self, id: EntityId) -> Option<&Screen> {
        self.screens.iter().find(|s| s.id == id)
    }

    pub fn widget(&self, id: EntityId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn action(&self, id: EntityId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn data_source(&self, id: EntityId) -> Option<&DataSource> {
        self.data_sources.iter().find(|d| d.id == id)
    }

    pub fn data_source_field(&self, id: EntityId) -> Option<&DataSourceField> {
        self.data_source_fields.iter().find(|f| f.id == id)
    }

    /// Widgets belonging to a screen, in stored order. Sibling ordering is
    /// (order key, id): the id doubles as creation order for tie-breaks.
    pub fn widgets_of_screen(&self, screen: EntityId) -> Vec<&Widget> {
        let mut out: Vec<&Widget> = self
            .widgets
            .iter()
            .filter(|w| w.screen == screen)
            .collect();
        out.sort_by_key(|w| (w.order, w.id));
        out
    }

    pub fn properties_of_widget(&self, widget: EntityId) -> Vec<&WidgetProperty> {
        self.properties.iter().filter(|p| p.widget == widget).collect()
    }

    pub fn fields_of_data_source(&self, data_source: EntityId) -> Vec<&DataSourceField> {
        let mut out: Vec<&DataSourceField> = self
            .data_source_fields
            .iter()
            .filter(|f| f.data_source == data_source)
            .collect();
        out.sort_by_key(|f| f.id);
        out
    }

    pub fn home_screens(&self) -> Vec<&Screen> {
        self.screens.iter().filter(|s| s.is_home).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct Application {
    pub id: EntityId,
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Globally unique reverse-domain identifier, e.g. "com.acme.shop".
    pub package_name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Compiled-in default for the generated client's API endpoint.
    #[serde(default)]
    pub default_base_url: Option<String>,

    /// Whether the generated client may persist a user-supplied endpoint
    /// override from its configuration screen.
    #[serde(default)]
    pub allow_endpoint_override: bool,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Theme {
    pub name: String,

    #[serde(default = "default_primary")]
    pub primary_color: String,

    #[serde(default = "default_accent")]
    pub accent_color: String,

    #[serde(default = "default_background")]
    pub background_color: String,

    #[serde(default = "default_text")]
    pub text_color: String,

    #[serde(default = "default_font")]
    pub font_family: String,

    #[serde(default)]
    pub dark_mode: bool,
}

fn default_primary() -> String {
    "#2196F3".to_string()
}
fn default_accent() -> String {
    "#FF4081".to_string()
}
fn default_background() -> String {
    "#FFFFFF".to_string()
}
fn default_text() -> String {
    "#000000".to_string()
}
fn default_font() -> String {
    "Roboto".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Screen {
    pub id: EntityId,
    pub name: String,

    /// Unique within the application, always starts with '/'.
    pub route: String,

    #[serde(default)]
    pub is_home: bool,

    #[serde(default)]
    pub app_bar_title: Option<String>,

    #[serde(default = "default_true")]
    pub show_app_bar: bool,

    #[serde(default = "default_true")]
    pub show_back_button: bool,

    #[serde(default)]
    pub background_color: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Widget {
    pub id: EntityId,
    pub screen: EntityId,

    /// Type tag from the fixed widget vocabulary; validated at emission.
    pub kind: String,

    #[serde(default)]
    pub parent: Option<EntityId>,

    #[serde(default)]
    pub order: u32,

    /// Optional stable handle used for data binding.
    #[serde(default)]
    pub handle: Option<String>,
}

/// A stored property record: a type tag plus mutually-exclusive value slots.
/// Which slot is authoritative is decided by `kind`; the resolver enforces
/// that the selected slot is actually populated.
#[derive(Debug, Deserialize)]
pub struct WidgetProperty {
    pub id: EntityId,
    pub widget: EntityId,
    pub name: String,
    pub kind: String,

    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub integer_value: Option<i64>,
    #[serde(default)]
    pub decimal_value: Option<f64>,
    #[serde(default)]
    pub boolean_value: Option<bool>,
    #[serde(default)]
    pub color_value: Option<String>,
    #[serde(default)]
    pub alignment_value: Option<String>,
    #[serde(default)]
    pub url_value: Option<String>,
    #[serde(default)]
    pub json_value: Option<String>,

    #[serde(default)]
    pub action_id: Option<EntityId>,
    #[serde(default)]
    pub data_source_field_id: Option<EntityId>,
    #[serde(default)]
    pub screen_id: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    RestApi,
    StaticJson,
}

#[derive(Debug, Deserialize)]
pub struct DataSource {
    pub id: EntityId,
    pub name: String,

    #[serde(default = "default_transport")]
    pub transport: TransportKind,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// When set, the generated client resolves the base URL through its
    /// configuration layer instead of the compiled-in value.
    #[serde(default)]
    pub use_dynamic_base_url: bool,
}

fn default_transport() -> TransportKind {
    TransportKind::RestApi
}
fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DataSourceField {
    pub id: EntityId,
    pub data_source: EntityId,
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// string | integer | decimal | boolean | date | datetime | url |
    /// image_url | email
    pub field_type: String,

    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Deserialize)]
pub struct Action {
    pub id: EntityId,
    pub name: String,

    /// navigate | navigate_back | show_dialog | show_snackbar | api_call |
    /// open_url | compose_email
    pub kind: String,

    #[serde(default)]
    pub target_screen: Option<EntityId>,

    #[serde(default)]
    pub data_source: Option<EntityId>,

    #[serde(default)]
    pub dialog_title: Option<String>,

    #[serde(default)]
    pub dialog_message: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

/// A declared third-party pub.dev package the application pulls in.
#[derive(Debug, Deserialize)]
pub struct Extension {
    pub package: String,

    /// Specific version like "1.2.0"; absent means "any".
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub class_name: Option<String>,

    #[serde(default)]
    pub import: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_order_ties_break_by_id() {
        let snap = Snapshot {
            application: test_app(),
            theme: test_theme(),
            screens: vec![],
            widgets: vec![
                widget(3, 1, 1, None),
                widget(1, 1, 1, None),
                widget(2, 1, 0, None),
            ],
            properties: vec![],
            data_sources: vec![],
            data_source_fields: vec![],
            actions: vec![],
            extensions: vec![],
        };

        let ids: Vec<EntityId> = snap.widgets_of_screen(1).iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    pub(crate) fn test_app() -> Application {
        Application {
            id: 1,
            name: "Demo".to_string(),
            description: String::new(),
            package_name: "com.example.demo".to_string(),
            version: "1.0.0".to_string(),
            default_base_url: None,
            allow_endpoint_override: false,
        }
    }

    pub(crate) fn test_theme() -> Theme {
        Theme {
            name: "Default".to_string(),
            primary_color: default_primary(),
            accent_color: default_accent(),
            background_color: default_background(),
            text_color: default_text(),
            font_family: default_font(),
            dark_mode: false,
        }
    }

    pub(crate) fn widget(id: EntityId, screen: EntityId, order: u32, parent: Option<EntityId>) -> Widget {
        Widget {
            id,
            screen,
            kind: "Text".to_string(),
            parent,
            order,
            handle: None,
        }
    }
}
