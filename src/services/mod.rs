pub mod hosting;
pub mod notifier;

pub use hosting::HostingService;
pub use notifier::{Notification, NotifierService};
