//! Scheduler and redirect URL builders.

mod redirect;
mod url;

pub use self::url::build_scheduler_url;
pub(crate) use self::url::set_query_param;
pub use redirect::build_redirect_path;
