mod describe;
mod dry_run;

pub use describe::handle_describe;
pub use dry_run::handle_dry_run;
