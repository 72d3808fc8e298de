use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::Focus;
use crate::core::view::{INPUT_HEIGHT, RenderModel, TITLE_HEIGHT};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{HistoryList, Spinner, TitleBar, Transcript};

/// Title bar, transcript | history, then the input row.
pub fn draw_ui(frame: &mut Frame, model: &RenderModel, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(TITLE_HEIGHT), Min(0), Length(INPUT_HEIGHT)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    TitleBar::new(model.model_name, model.notice).render(frame, title_area);

    let [transcript_area, history_area] = split_panes(main_area, model.layout.history_width);
    Transcript::new(&mut tui.transcript, model.messages).render(frame, transcript_area);
    if history_area.width > 0 {
        HistoryList::new(
            &mut tui.history_list,
            model.history,
            model.selected,
            model.focus == Focus::HistoryList,
        )
        .render(frame, history_area);
    }

    if model.pending {
        Spinner { state: tui.spinner }.render(frame, input_area);
    } else {
        tui.input_box.focused = model.focus == Focus::InputArea;
        tui.input_box.render(frame, input_area);
    }
}

/// The history pane takes `history_width` columns on the right, clamped to
/// what the frame actually has.
fn split_panes(area: Rect, history_width: u16) -> [Rect; 2] {
    let history_width = history_width.min(area.width);
    Layout::horizontal([
        Constraint::Length(area.width - history_width),
        Constraint::Length(history_width),
    ])
    .areas(area)
}
