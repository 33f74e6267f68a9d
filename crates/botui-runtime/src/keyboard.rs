//! Keyboard assembly (spec §4.5, §8 testable property): groups a flat
//! button list by `rowIndex`, splits a row into sub-rows once an
//! element's own `columns` is reached, and treats `Split` (a button with
//! `forces_row_break`) as an explicit row break.

use botui_elements::button::{Button, ButtonAction};
use botui_transport::client::{ButtonAction as TransportAction, KeyboardButton, ReplyMarkup};

/// Groups `buttons` (already in element/definition order, spec §4.5 keeps
/// `rowIndex` ascending by construction) into visual rows.
pub fn assemble_rows(buttons: Vec<Button>) -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = Vec::new();
    let mut current: Vec<Button> = Vec::new();
    let mut current_row_index: Option<usize> = None;
    let mut run_count = 0usize;

    for button in buttons {
        if button.forces_row_break {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            current_row_index = None;
            run_count = 0;
            continue;
        }

        if current_row_index != Some(button.row_index) {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            current_row_index = Some(button.row_index);
            run_count = 0;
        } else if run_count >= button.columns.max(1) {
            rows.push(std::mem::take(&mut current));
            run_count = 0;
        }

        run_count += 1;
        current.push(button);
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Appends a back-button row (spec §4.5: "If `backToParent && parent` and
/// this isn't the root, append a final row with the back button").
pub fn with_back_row(mut rows: Vec<Vec<Button>>, back_title: &str, back_token: String) -> Vec<Vec<Button>> {
    rows.push(vec![Button::callback(back_title, back_token, usize::MAX, 1)]);
    rows
}

/// Bridges `botui-elements::Button` to the wire-level `ReplyMarkup` a
/// `BotClient` understands.
pub fn to_reply_markup(rows: &[Vec<Button>]) -> ReplyMarkup {
    ReplyMarkup {
        rows: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| KeyboardButton {
                        text: b.text.clone(),
                        action: match &b.action {
                            ButtonAction::Callback(t) => TransportAction::Callback(t.clone()),
                            ButtonAction::Url(u) => TransportAction::Url(u.clone()),
                            ButtonAction::WebApp(u) => TransportAction::WebApp(u.clone()),
                        },
                    })
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cb(text: &str, row: usize, columns: usize) -> Button {
        Button::callback(text, format!("t-{text}"), row, columns)
    }

    fn split(row: usize) -> Button {
        let mut b = Button::callback("split", "ignored", row, 1);
        b.forces_row_break = true;
        b
    }

    #[test]
    fn groups_by_row_index() {
        let rows = assemble_rows(vec![cb("a", 0, 9), cb("b", 0, 9), cb("c", 1, 9)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn splits_within_a_row_once_columns_is_reached() {
        let rows = assemble_rows(vec![cb("a", 0, 2), cb("b", 0, 2), cb("c", 0, 2)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn split_element_forces_a_row_break() {
        let rows = assemble_rows(vec![cb("a", 0, 9), split(0), cb("b", 0, 9)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![cb("a", 0, 9)]);
        assert_eq!(rows[1], vec![cb("b", 0, 9)]);
    }

    #[test]
    fn every_row_respects_its_buttons_declared_column_cap() {
        let rows = assemble_rows(vec![cb("a", 0, 3), cb("b", 0, 3), cb("c", 0, 3), cb("d", 0, 3)]);
        for row in &rows {
            assert!(row.len() <= 3);
        }
    }

    #[test]
    fn back_row_is_appended_last() {
        let rows = assemble_rows(vec![cb("a", 0, 9)]);
        let rows = with_back_row(rows, "« Back", "back-token".to_string());
        assert_eq!(rows.last().unwrap()[0].text, "« Back");
    }
}
