//! Adapter answering every verb with fixed, deterministic data.

use std::process::ExitCode;

use dt_adapter::Typed;
use dt_adapter::reference::StaticAdapter;

fn main() -> ExitCode {
    dt_adapter::run(Typed(StaticAdapter))
}
