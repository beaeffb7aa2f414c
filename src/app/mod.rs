pub mod bootstrap;
pub mod presenter;
pub mod view;

pub use presenter::SearchPresenter;
pub use view::{ConsoleView, StockView};
