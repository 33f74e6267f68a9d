//! `Split` (spec §4.5): emits nothing; a keyboard row separator during
//! assembly. Carries no state beyond its declared `rowIndex`.

use botui_callback::CallbackRegistry;
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::ComponentContext;

use crate::button::Button;
use crate::element::{ElementBase, MenuElement};
use std::sync::Arc;

pub struct Split {
    base: Arc<ElementBase>,
}

impl Split {
    pub fn new(def: &ComponentDefinition) -> Result<Self, PageError> {
        Ok(Self { base: Arc::new(ElementBase::apply_definition(&[], def)?) })
    }
}

impl MenuElement for Split {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn row_index(&self) -> usize {
        self.base.row_index()
    }

    fn hidden(&self, _ctx: &ComponentContext) -> bool {
        false
    }

    fn base(&self) -> &Arc<ElementBase> {
        &self.base
    }

    fn build(&self, _ctx: &ComponentContext, _registry: &CallbackRegistry) -> Vec<Button> {
        Vec::new()
    }

    fn dispose(&self, _registry: &CallbackRegistry) {}

    fn is_split(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_emits_no_buttons() {
        let split = Split::new(&ComponentDefinition::new("split")).unwrap();
        let registry = CallbackRegistry::new("s1");
        // No ScriptContext needed since Split never reads a prop.
        assert_eq!(split.row_index(), 0);
        let _ = registry;
    }
}
