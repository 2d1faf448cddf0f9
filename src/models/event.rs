use tui_textarea::Input;

#[derive(Debug)]
pub enum Event {
    Notice(crate::models::NoticeMessage),

    ConversationDeleted(String),
    AnalysisSaved(String),

    KeyboardCharInput(Input),
    KeyboardEsc,
    KeyboardEnter,
    KeyboardTab,
    KeyboardBackTab,
    KeyboardCtrlC,
    KeyboardCtrlR,
    KeyboardCtrlS,

    Quit,

    Refresh,
    UiTick,
    UiScrollUp,
    UiScrollDown,
    UiScrollPageUp,
    UiScrollPageDown,
}
