//! Runs compiled code on a minimal stack machine to check results.
use jackc::compile_str;
use std::collections::HashMap;

const ARITH: &str = include_str!("Arith.jack");

#[derive(Debug, Clone)]
enum Op {
    Push(String, usize),
    Pop(String, usize),
    Arith(String),
    Label,
    Goto(String),
    IfGoto(String),
    Call(String, usize),
    Function(usize),
    Return,
}

fn parse(vm: &str) -> Vec<Op> {
    vm.lines()
        .map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["push", seg, i] => Op::Push(seg.to_string(), i.parse().unwrap()),
                ["pop", seg, i] => Op::Pop(seg.to_string(), i.parse().unwrap()),
                ["label", _] => Op::Label,
                ["goto", label] => Op::Goto(label.to_string()),
                ["if-goto", label] => Op::IfGoto(label.to_string()),
                ["call", name, n] => Op::Call(name.to_string(), n.parse().unwrap()),
                ["function", _, n] => Op::Function(n.parse().unwrap()),
                ["return"] => Op::Return,
                [cmd] => Op::Arith(cmd.to_string()),
                _ => panic!("malformed instruction: {line}"),
            }
        })
        .collect()
}

struct Frame {
    function: String,
    ret: usize,
    args: Vec<i16>,
    locals: Vec<i16>,
}

/// Call `entry` with the given arguments and return its result.
///
/// Supports functions only, no objects, arrays or statics.
fn run(vm: &str, entry: &str, args: &[i16]) -> i16 {
    let code = parse(vm);

    let mut functions = HashMap::new();
    let mut labels = HashMap::new();
    let mut current = String::new();
    for (pc, line) in vm.lines().enumerate() {
        if let Some(rest) = line.strip_prefix("function ") {
            current = rest.split(' ').next().unwrap().to_string();
            functions.insert(current.clone(), pc);
        } else if let Some(label) = line.strip_prefix("label ") {
            labels.insert((current.clone(), label.to_string()), pc);
        }
    }

    let mut stack: Vec<i16> = vec![];
    let mut temp = [0i16; 8];
    let mut frames = vec![Frame {
        function: entry.to_string(),
        ret: usize::MAX,
        args: args.to_vec(),
        locals: vec![],
    }];
    let mut pc = functions[entry];

    for _ in 0..1_000_000 {
        let op = code[pc].clone();
        pc += 1;
        let frame = frames.last_mut().unwrap();

        match op {
            Op::Function(n) => frame.locals = vec![0; n],
            Op::Push(seg, i) => stack.push(match seg.as_str() {
                "constant" => i as i16,
                "argument" => frame.args[i],
                "local" => frame.locals[i],
                "temp" => temp[i],
                _ => panic!("unsupported segment {seg}"),
            }),
            Op::Pop(seg, i) => {
                let value = stack.pop().unwrap();
                match seg.as_str() {
                    "argument" => frame.args[i] = value,
                    "local" => frame.locals[i] = value,
                    "temp" => temp[i] = value,
                    _ => panic!("unsupported segment {seg}"),
                }
            }
            Op::Arith(cmd) => {
                let b = stack.pop().unwrap();
                let value = match cmd.as_str() {
                    "neg" => b.wrapping_neg(),
                    "not" => !b,
                    _ => {
                        let a = stack.pop().unwrap();
                        match cmd.as_str() {
                            "add" => a.wrapping_add(b),
                            "sub" => a.wrapping_sub(b),
                            "and" => a & b,
                            "or" => a | b,
                            "eq" => -((a == b) as i16),
                            "gt" => -((a > b) as i16),
                            "lt" => -((a < b) as i16),
                            _ => panic!("unknown command {cmd}"),
                        }
                    }
                };
                stack.push(value);
            }
            Op::Label => {}
            Op::Goto(label) => pc = labels[&(frame.function.clone(), label)],
            Op::IfGoto(label) => {
                if stack.pop().unwrap() != 0 {
                    pc = labels[&(frame.function.clone(), label)];
                }
            }
            Op::Call(name, n) => {
                let args = stack.split_off(stack.len() - n);
                match name.as_str() {
                    "Math.multiply" => stack.push(args[0].wrapping_mul(args[1])),
                    "Math.divide" => stack.push(args[0] / args[1]),
                    _ => {
                        frames.push(Frame {
                            function: name.clone(),
                            ret: pc,
                            args,
                            locals: vec![],
                        });
                        pc = functions[&name];
                    }
                }
            }
            Op::Return => {
                let value = stack.pop().unwrap();
                let done = frames.pop().unwrap();
                if frames.is_empty() {
                    return value;
                }
                pc = done.ret;
                stack.push(value);
            }
        }
    }

    panic!("{entry} did not return");
}

#[test]
fn test_subtraction_is_left_to_right() {
    let vm = compile_str(ARITH).unwrap();
    assert_eq!(run(&vm, "Main.sub", &[]), 5);
}

#[test]
fn test_division_is_left_to_right() {
    let vm = compile_str(ARITH).unwrap();
    assert_eq!(run(&vm, "Main.div", &[]), 2);
}

#[test]
fn test_no_operator_precedence() {
    let vm = compile_str(ARITH).unwrap();
    assert_eq!(run(&vm, "Main.mixed", &[]), 20);
}

#[test]
fn test_unary_operators() {
    let vm = compile_str(ARITH).unwrap();
    assert_eq!(run(&vm, "Main.neg", &[]), 5);
    assert_eq!(run(&vm, "Main.flags", &[]), -1);
}

#[test]
fn test_control_flow() {
    let vm = compile_str(ARITH).unwrap();
    assert_eq!(run(&vm, "Main.sum", &[10]), 55);
    assert_eq!(run(&vm, "Main.sum", &[0]), 0);
    assert_eq!(run(&vm, "Main.max", &[3, 9]), 9);
    assert_eq!(run(&vm, "Main.max", &[9, 3]), 9);
    assert_eq!(run(&vm, "Main.fact", &[5]), 120);
}

#[test]
fn test_void_call_leaves_one_value() {
    let vm = compile_str(ARITH).unwrap();
    assert_eq!(run(&vm, "Main.noop", &[]), 0);
    assert_eq!(run(&vm, "Main.callsNoop", &[]), 7);
}
