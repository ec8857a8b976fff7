//! Server management module.
//!
//! This module holds the building blocks the [`ServerManager`](crate::ServerManager)
//! composes: picking a port, launching a script, tracking it, probing it and
//! reading its logs. All public components log through `tracing`.
//!
//! # Components
//!
//! * `port` - Randomized free-port allocation within a range
//! * `args` - Ordered keyword arguments rendered as CLI flags
//! * `process` - Spawning, signalling and reaping server processes
//! * `registry` - Name to running-server records
//! * `health` - Liveness probes against control endpoints
//! * `logs` - Log tailing and noise filtering
//! * `inspect` - Flags a script declares through `add_argument` calls
//! * `lifecycle` - Per-name state and event history
//!
//! # Examples
//!
//! Building a launch command line:
//!
//! ```
//! use mcp_server_manager::server::{LaunchArgs, command_args};
//! use std::path::Path;
//!
//! let args = LaunchArgs::new().arg("seed", 42).arg("debug", true);
//! let argv = command_args(Path::new("/srv/random_server.py"), 8765, &args);
//! assert_eq!(argv, vec!["/srv/random_server.py", "8765", "--seed", "42", "--debug"]);
//! ```
//!
//! Allocating a port:
//!
//! ```no_run
//! use mcp_server_manager::server::port;
//!
//! let port = port::allocate(8600, 8900).unwrap();
//! assert!((8600..=8900).contains(&port));
//! ```

mod args;
pub mod health;
pub mod inspect;
pub mod lifecycle;
pub mod logs;
pub mod port;
mod process;
mod registry;

pub use args::{ArgValue, LaunchArgs};
pub use health::HealthChecker;
pub use inspect::CliArgument;
pub use lifecycle::{ServerEvent, ServerLifecycleEvent, ServerLifecycleManager, ServerState};
pub use port::PortAllocator;
pub use process::{ServerProcess, command_args, resolve_script};
pub use registry::{Registry, ServerRecord};
