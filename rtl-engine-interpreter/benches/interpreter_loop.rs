//! Fetch/execute loop throughput

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rtl_engine_interpreter::Interpreter;
use rtl_ir::{IrAddress, IrBuilder, IrOperand, Opcode, OperandSize, Program};
use rtl_register::PpcPolicy;

const D: OperandSize = OperandSize::Dword;
const B: OperandSize = OperandSize::Byte;

/// Count `%r3` down to zero with a sub-address back edge
fn countdown(iterations: u128) -> Program {
    let mut builder = IrBuilder::new(0x1000);
    builder
        .push(
            Opcode::Str,
            IrOperand::integer(iterations, D),
            IrOperand::empty(),
            IrOperand::register("%r3", D),
        )
        .push(
            Opcode::Sub,
            IrOperand::register("%r3", D),
            IrOperand::integer(1, D),
            IrOperand::register("%r3", D),
        )
        .push(
            Opcode::Bisz,
            IrOperand::register("%r3", D),
            IrOperand::empty(),
            IrOperand::register("t0", B),
        )
        .push(
            Opcode::Xor,
            IrOperand::register("t0", B),
            IrOperand::integer(1, B),
            IrOperand::register("t1", B),
        )
        .push(
            Opcode::Jcc,
            IrOperand::register("t1", B),
            IrOperand::empty(),
            IrOperand::sub_address(IrAddress::new(0x1000, 1)),
        );
    builder
        .build_program()
        .expect("countdown program has unique addresses")
}

fn bench_countdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter_countdown");
    let policy = Arc::new(PpcPolicy::new());

    for iterations in [16u128, 256, 4096] {
        let program = countdown(iterations);
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &program,
            |b, program| {
                b.iter(|| {
                    let mut interp = Interpreter::with_policy(policy.clone());
                    interp.interpret(black_box(program), 0x1000).ok();
                    black_box(interp.stats().executed)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_countdown);
criterion_main!(benches);
