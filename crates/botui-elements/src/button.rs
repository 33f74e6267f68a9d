//! A rendered keyboard button (spec §4 common protocol: "each element
//! emits one or more buttons via `build()`").

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Opaque token the chat platform echoes back on click.
    Callback(String),
    Url(String),
    WebApp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
    /// Row grouping key (spec §4.5 keyboard assembly groups by this).
    pub row_index: usize,
    /// Elements split a row into sub-rows once this many buttons from the
    /// *same element* have accumulated (spec §4.5).
    pub columns: usize,
    /// `Split` forces a row break regardless of `columns`.
    pub forces_row_break: bool,
}

impl Button {
    pub fn callback(text: impl Into<String>, token: impl Into<String>, row_index: usize, columns: usize) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(token.into()),
            row_index,
            columns,
            forces_row_break: false,
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>, row_index: usize, columns: usize) -> Self {
        Self { text: text.into(), action: ButtonAction::Url(url.into()), row_index, columns, forces_row_break: false }
    }

    pub fn web_app(text: impl Into<String>, url: impl Into<String>, row_index: usize, columns: usize) -> Self {
        Self { text: text.into(), action: ButtonAction::WebApp(url.into()), row_index, columns, forces_row_break: false }
    }
}
