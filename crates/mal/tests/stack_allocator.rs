//! Integration tests for the fixed and variable stacks

use mal::core::WORD_SIZE;
use mal::prelude::*;

#[test]
fn test_fixed_stack_lifo() {
    let mut stack =
        FixedStack::with_source(4096, 64, SimulatedPages::new(), AllocatorConfig::default())
            .expect("Failed to create stack");

    let a = stack.alloc().unwrap();
    let b = stack.alloc().unwrap();
    let c = stack.alloc().unwrap();
    stack.bytes_mut(a).unwrap().fill(0xAA);
    stack.bytes_mut(b).unwrap().fill(0xBB);
    stack.bytes_mut(c).unwrap().fill(0xCC);

    assert_eq!(stack.free(), Some(c));
    assert_eq!(stack.free(), Some(b));
    assert_eq!(stack.bytes(a).unwrap()[0], 0xAA);
    assert_eq!(stack.free(), Some(a));
    assert_eq!(stack.free(), None);
    assert_eq!(stack.taken(), 0);
}

#[test]
fn test_fixed_stack_fills_exactly() {
    let mut stack =
        FixedStack::with_source(8192, 1024, SimulatedPages::new(), AllocatorConfig::default())
            .unwrap();
    for i in 0..8 {
        assert_eq!(stack.alloc().unwrap().index(), i);
    }
    assert!(stack.alloc().is_err());
    stack.free();
    assert_eq!(stack.alloc().unwrap().index(), 7);
}

#[test]
fn test_variable_stack_roundtrip() {
    let mut stack =
        VariableStack::with_source(4096, SimulatedPages::new(), AllocatorConfig::default())
            .expect("Failed to create stack");
    let start = stack.top();

    let a = stack.alloc(10).unwrap();
    let b = stack.alloc(20).unwrap();
    let c = stack.alloc(5).unwrap();
    assert_eq!(stack.used(), 35 + 3 * WORD_SIZE);

    assert_eq!(stack.free().unwrap(), Some(c));
    assert_eq!(stack.free().unwrap(), Some(b));
    assert_eq!(stack.free().unwrap(), Some(a));
    assert_eq!(stack.top(), start);
    assert_eq!(stack.used(), 0);
}

#[test]
fn test_variable_stack_checked_release() {
    let mut stack =
        VariableStack::with_source(4096, SimulatedPages::new(), AllocatorConfig::default())
            .unwrap();
    let outer = stack.alloc(100).unwrap();
    let inner = stack.alloc(50).unwrap();

    let err = stack.release(outer).unwrap_err();
    assert!(matches!(
        err,
        MemoryError::PreconditionViolation {
            allocator: "variable stack",
            ..
        }
    ));

    stack.release(inner).unwrap();
    stack.release(outer).unwrap();
    assert_eq!(stack.depth(), 0);
}

#[test]
fn test_variable_stack_nested_payloads() {
    let mut stack = VariableStack::new(4096).expect("Failed to create stack");
    let frames: Vec<_> = (1..=10u8)
        .map(|n| {
            let frame = stack.alloc(usize::from(n)).unwrap();
            stack.bytes_mut(frame).unwrap().fill(n);
            frame
        })
        .collect();

    for frame in frames.iter().rev() {
        let len = frame.len() as u8;
        assert!(stack.bytes(*frame).unwrap().iter().all(|&b| b == len));
        stack.release(*frame).unwrap();
    }
    stack.destroy().unwrap();
}

#[test]
fn test_general_allocator_is_unimplemented() {
    let err = GeneralAllocator::with_config(
        4096,
        AllocatorConfig::default().with_failure_mode(FailureMode::Propagate),
    )
    .unwrap_err();
    assert_eq!(err.code(), "MEM:UNIMPLEMENTED");
}

#[test]
fn test_variable_stack_rejects_popped_handles() {
    let mut stack =
        VariableStack::with_source(4096, SimulatedPages::new(), AllocatorConfig::default())
            .unwrap();
    let popped = stack.alloc(8).unwrap();
    stack.free().unwrap();
    let x = stack.alloc(0).unwrap();
    let y = stack.alloc(16).unwrap();

    assert!(matches!(
        stack.bytes_mut(popped),
        Err(MemoryError::PreconditionViolation { .. })
    ));

    stack.release(y).unwrap();
    stack.release(x).unwrap();
    assert_eq!(stack.used(), 0);
}
