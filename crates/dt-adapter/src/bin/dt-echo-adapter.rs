//! Adapter that echoes every request back as `{"verb", "params"}`.
//!
//! ```bash
//! echo '{"provider":"vercel"}' | dt-echo-adapter auth:start
//! ```

use std::process::ExitCode;

use dt_adapter::reference::EchoAdapter;

fn main() -> ExitCode {
    dt_adapter::run(EchoAdapter)
}
