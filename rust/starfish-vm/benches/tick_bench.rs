use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use starfish_core::{Codebox, Stack, Value};
use starfish_vm::io::SharedOutput;
use starfish_vm::VM;

// Decrements the top of the stack until it reaches zero.
const COUNTDOWN: &str = ":?!;1-";

// Prints every number from the top of the stack down to 0, looping back through mirrors.
const PRINT_LOOP: &str = ">:n:?!;1-ao\\\n^          /";

fn countdown_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("countdown");
    let codebox = Codebox::parse(COUNTDOWN).expect("countdown should load");

    for n in [100i64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let initial = Stack::from_values(vec![Value::Int(black_box(n))]);
                let mut vm = VM::with_stack(codebox.clone(), initial);
                vm.run().expect("countdown should halt");
                black_box(vm.ticks())
            });
        });
    }
    group.finish();
}

fn output_benchmark(c: &mut Criterion) {
    let codebox = Codebox::parse(PRINT_LOOP).expect("print loop should load");

    c.bench_function("print_loop_500", |b| {
        b.iter(|| {
            let initial = Stack::from_values(vec![Value::Int(500)]);
            let mut vm = VM::with_stack(codebox.clone(), initial);
            let output = SharedOutput::new();
            vm.set_output(output.clone());
            let _ = vm.run();
            black_box(output.contents().len())
        });
    });
}

criterion_group!(benches, countdown_benchmark, output_benchmark);
criterion_main!(benches);
