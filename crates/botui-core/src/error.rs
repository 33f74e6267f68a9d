use std::fmt;

/// Errors raised while compiling or resolving a page definition.
///
/// Mirrors the "one enum per failure family" shape used throughout this
/// codebase rather than a single opaque string, so callers can match on
/// the kind of failure (duplicate prop source vs. missing resource vs.
/// malformed directive) without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Same prop was set from two sources (`:name` binding and a child
    /// element / attribute of the same name) — compile-time error per
    /// the MenuElement common protocol (§4.4).
    DuplicatePropSource { component_id: String, prop: String },
    /// A `Switch` component was defined with zero options.
    EmptyOptionList { component_id: String },
    /// A resource (template, image, i18n pack) could not be located.
    ResourceNotFound { name: String, tried: Vec<String> },
    /// `openSubPage` attempted to navigate between incompatible message
    /// formats (text <-> media).
    IncompatibleNavigation { from: &'static str, to: &'static str },
    /// Generic malformed definition (missing required field, bad enum tag).
    Malformed(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::DuplicatePropSource { component_id, prop } => {
                write!(f, "component '{component_id}': prop '{prop}' set from two sources")
            }
            PageError::EmptyOptionList { component_id } => {
                write!(f, "component '{component_id}': Switch requires at least one option")
            }
            PageError::ResourceNotFound { name, tried } => {
                write!(f, "resource '{name}' not found, tried: {}", tried.join(", "))
            }
            PageError::IncompatibleNavigation { from, to } => {
                write!(f, "cannot navigate in place from '{from}' page to '{to}' page, formats are incompatible")
            }
            PageError::Malformed(msg) => write!(f, "malformed page definition: {msg}"),
        }
    }
}

impl std::error::Error for PageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duplicate_prop_source() {
        let e = PageError::DuplicatePropSource { component_id: "c1".into(), prop: "title".into() };
        assert_eq!(e.to_string(), "component 'c1': prop 'title' set from two sources");
    }

    #[test]
    fn display_incompatible_navigation() {
        let e = PageError::IncompatibleNavigation { from: "text", to: "media" };
        assert!(e.to_string().contains("text"));
        assert!(e.to_string().contains("media"));
    }
}
