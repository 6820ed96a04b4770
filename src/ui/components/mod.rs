pub mod cue_panel;
pub mod health_bar;
pub mod ledger_sidebar;
pub mod menu;
pub mod report_view;
