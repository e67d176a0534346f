#![no_main]

use libfuzzer_sys::fuzz_target;

use mirlife::analysis::{get_lifetimes, TypeResolve};
use mirlife::env::Program;
use mirlife::ir::LValue;

fuzz_target!(|code: &[u8]| {
    let Ok(code) = std::str::from_utf8(code) else { return };
    let Ok(program) = ron::from_str::<Program>(code) else { return };

    for (name, fcn) in &program.functions {
        let mut mir_res = TypeResolve::new(name.as_str(), fcn, &program.krate);

        let slots = (0..fcn.args.len())
            .map(|idx| LValue::Argument(idx as u32))
            .chain((0..fcn.locals.len()).map(|idx| LValue::Local(idx as u32)));

        for lv in slots {
            let _ = mir_res.get_lvalue_type(&lv);
            let _ = mir_res.get_lvalue_type(&lv.clone().deref().field(0));
        }

        // analysis failures are expected on arbitrary input; only panics are interesting
        let _ = get_lifetimes(&mut mir_res);
    }
});
