use std::io::{self, Write};

use itertools::Itertools;
use mirlife::analysis::{render_lifetime, ValueLifetimes};
use mirlife::ir::{Function, Type};

pub fn dump_function_debug(name: &str, fcn: &Function, mut out: impl Write) -> io::Result<()> {
    writeln!(out, "{}: {:#?}", name, fcn)?;
    writeln!(out, "edges:")?;

    for (bb_idx, bb) in fcn.blocks.iter().enumerate() {
        let successors = bb.terminator.successors();
        writeln!(
            out,
            "    BB{} -> [{}]",
            bb_idx,
            successors.iter().format_with(", ", |bb, f| f(&format_args!("BB{}", bb)))
        )?;
    }

    Ok(())
}

pub fn dump_types(name: &str, types: &[(String, Type)], mut out: impl Write) -> io::Result<()> {
    writeln!(out, "fn {}:", name)?;

    for (label, ty) in types {
        writeln!(out, "    {}: {}", label, ty)?;
    }

    Ok(())
}

pub fn dump_lifetimes(
    name: &str,
    lifetimes: &ValueLifetimes,
    mut out: impl Write,
) -> io::Result<()> {
    let offsets = lifetimes.block_offsets();
    writeln!(out, "fn {}:", name)?;
    writeln!(out, "    block offsets: {}", offsets)?;

    for (idx, lifetime) in lifetimes.args().iter().enumerate() {
        writeln!(out, "    {}", render_lifetime("a", idx, lifetime, offsets))?;
    }

    for (idx, lifetime) in lifetimes.slots().iter().enumerate() {
        writeln!(out, "    {}", render_lifetime("_", idx, lifetime, offsets))?;
    }

    Ok(())
}
