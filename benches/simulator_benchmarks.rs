use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tomasulo_sim::instruction::Register;
use tomasulo_sim::{parse_program, Processor, ProcessorConfig};

fn chained_dependency_program(n: usize) -> String {
    // Each ADD depends on the previous one's result, forcing the pipeline
    // to forward every value across the CDB rather than overlap freely.
    let mut program = String::with_capacity(n * 16);
    program.push_str("ADD R1, R0, R0\n");
    for i in 0..n {
        let dst = (i % 30) + 2;
        let src = if i == 0 { 1 } else { ((i - 1) % 30) + 2 };
        program.push_str(&format!("ADD R{}, R{}, R0\n", dst, src));
    }
    program
}

fn independent_program(n: usize) -> String {
    let mut program = String::with_capacity(n * 16);
    for i in 0..n {
        program.push_str(&format!("ADD R{}, R0, R0\n", (i % 30) + 1));
    }
    program
}

fn branchy_program(n: usize) -> String {
    let mut program = String::with_capacity(n * 24);
    program.push_str("ADD R1, R0, R0\n");
    for _ in 0..n {
        program.push_str("BEQ R1, R0, 0\n");
        program.push_str("ADD R2, R1, R1\n");
    }
    program
}

fn dependency_chain_benchmark(c: &mut Criterion) {
    let program = chained_dependency_program(256);
    c.bench_function("dependency_chain_256", |b| {
        b.iter(|| {
            let instructions = parse_program(&program).unwrap();
            let mut processor = Processor::new(ProcessorConfig::new());
            processor.load(instructions);
            processor.run().unwrap();
            black_box(processor.registers().value(Register::R(1)));
        });
    });
}

fn independent_instructions_benchmark(c: &mut Criterion) {
    let program = independent_program(256);
    c.bench_function("independent_adds_256", |b| {
        b.iter(|| {
            let instructions = parse_program(&program).unwrap();
            let mut processor = Processor::new(ProcessorConfig::new());
            processor.load(instructions);
            processor.run().unwrap();
            black_box(processor.metrics().committed_instructions);
        });
    });
}

fn branch_speculation_benchmark(c: &mut Criterion) {
    let program = branchy_program(128);
    c.bench_function("branch_speculation_128", |b| {
        b.iter(|| {
            let instructions = parse_program(&program).unwrap();
            let mut processor = Processor::new(ProcessorConfig::new());
            processor.load(instructions);
            processor.run().unwrap();
            black_box(processor.metrics().mispredictions);
        });
    });
}

fn rob_pressure_benchmark(c: &mut Criterion) {
    let program = independent_program(256);
    c.bench_function("rob_pressure_small_rob", |b| {
        b.iter(|| {
            let instructions = parse_program(&program).unwrap();
            let mut processor = Processor::new(ProcessorConfig::new().with_rob_size(4));
            processor.load(instructions);
            processor.run().unwrap();
            black_box(processor.metrics().bubble_cycles);
        });
    });
}

criterion_group!(
    benches,
    dependency_chain_benchmark,
    independent_instructions_benchmark,
    branch_speculation_benchmark,
    rob_pressure_benchmark
);
criterion_main!(benches);
