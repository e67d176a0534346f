use tracing::{debug, Level};

use crate::util::pad_right;

use super::lifetimes::{BlockOffsets, ValueLifetime, ValueLifetimes};

/// Receives the lifetimes of each function once they have been computed.
pub trait LifetimeObserver {
    fn lifetimes_computed(&mut self, path: &str, lifetimes: &ValueLifetimes);
}

impl LifetimeObserver for () {
    fn lifetimes_computed(&mut self, _path: &str, _lifetimes: &ValueLifetimes) {}
}

/// Renders one bitmap as `_$3    : XX |X  `, with a `|` before the start of every block but
/// the first.
pub fn render_lifetime(
    prefix: &str,
    idx: usize,
    lifetime: &ValueLifetime,
    offsets: &BlockOffsets,
) -> String {
    let mut result = pad_right(&format!("{}${}", prefix, idx), 7);
    result.push_str(" : ");

    for (j, &live) in lifetime.bits().iter().enumerate() {
        if j != 0 && offsets.is_block_start(j) {
            result.push('|');
        }

        result.push(if live { 'X' } else { ' ' });
    }

    result
}

/// Emits the bitmaps of every argument and local at the `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDump;

impl LifetimeObserver for TracingDump {
    fn lifetimes_computed(&mut self, path: &str, lifetimes: &ValueLifetimes) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }

        let offsets = lifetimes.block_offsets();

        for (idx, lifetime) in lifetimes.args().iter().enumerate() {
            debug!("{}: {}", path, render_lifetime("a", idx, lifetime, offsets));
        }

        for (idx, lifetime) in lifetimes.slots().iter().enumerate() {
            debug!("{}: {}", path, render_lifetime("_", idx, lifetime, offsets));
        }
    }
}
