use zax::{
    control::{ControlUnit, StopCause},
    datapath::DataPath,
    isa::Word,
    symbolic::SourceProgram,
};

fn machine(source: &str, input: Vec<Word>) -> ControlUnit {
    let program = SourceProgram::parse(source)
        .expect("could not parse the source")
        .translate()
        .expect("could not translate the source");

    let mut datapath = DataPath::new(64, 64, input);
    datapath.load_program(&program);

    ControlUnit::new(datapath)
}

#[test]
fn test_sum_of_two_inputs() {
    let source = r#"
        section .data
        a: 0x0

        section .code
        input
        store a
        input
        add a
        output
        hlt
    "#;

    let mut control = machine(source, vec![20, 22]);
    let result = control.run();

    assert_eq!(result.cause, StopCause::Halted);
    assert_eq!(control.dp.output, vec![42]);
    assert!(control.dp.input.is_empty());
}

#[test]
fn test_echo_stops_when_the_input_runs_dry() {
    let source = r#"
        section .code
        loop: input
              output
              jmp loop
    "#;

    let mut control = machine(source, vec![104, 105]);
    let result = control.run();

    // The third `input` starves; everything echoed so far stands.
    assert_eq!(result.cause, StopCause::InputExhausted);
    assert_eq!(control.dp.output, vec![104, 105]);
}

#[test]
fn test_input_on_an_empty_queue_is_not_a_halt() {
    let source = r#"
        section .code
        input
        output
        hlt
    "#;

    let mut control = machine(source, Vec::new());
    let result = control.run();

    assert_eq!(result.cause, StopCause::InputExhausted);
    assert!(control.dp.output.is_empty());
}

#[test]
fn test_ports_and_the_primary_stream_are_independent() {
    let source = r#"
        section .code
        inp 0x1
        outp 0x2
        inp 0x2
        output
        hlt
    "#;

    let mut control = machine(source, Vec::new());
    control.dp.ports[0].incoming.push_back(5);
    control.dp.ports[1].incoming.push_back(9);

    let result = control.run();

    assert_eq!(result.cause, StopCause::Halted);
    assert_eq!(control.dp.ports[1].outgoing, vec![5]);
    assert_eq!(control.dp.output, vec![9]);
    assert!(control.dp.ports[0].outgoing.is_empty());
}

#[test]
fn test_starved_port_is_reported_like_starved_input() {
    let source = r#"
        section .code
        inp 0x2
        hlt
    "#;

    let mut control = machine(source, Vec::new());
    let result = control.run();

    assert_eq!(result.cause, StopCause::InputExhausted);
}

#[test]
fn test_port_queues_drain_in_arrival_order() {
    let source = r#"
        section .code
        inp 0x1
        output
        inp 0x1
        output
        hlt
    "#;

    let mut control = machine(source, Vec::new());
    control.dp.ports[0].incoming.push_back(1);
    control.dp.ports[0].incoming.push_back(2);

    control.run();

    assert_eq!(control.dp.output, vec![1, 2]);
}
