//! Basic usage of the region-backed allocators
//!
//! Run with `RUST_LOG=debug cargo run --example basic_usage` to see the
//! allocator lifecycle events.

use mal::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> mal::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    mal::init()?;
    println!("mal {} (page size {} bytes)\n", mal::VERSION, mal::page_size());

    arena_example()?;
    pool_example()?;
    stack_example()?;

    Ok(())
}

fn arena_example() -> mal::Result<()> {
    println!("=== Arena ===");
    let mut arena = Arena::with_config(16 * 1024, AllocatorConfig::debug())?;

    let greeting = arena.alloc(5)?;
    arena.bytes_mut(greeting)?.copy_from_slice(b"hello");
    let numbers = arena.alloc(4 * 8)?;
    for (i, chunk) in arena.bytes_mut(numbers)?.chunks_exact_mut(8).enumerate() {
        chunk.copy_from_slice(&(i as u64 * 10).to_le_bytes());
    }

    println!(
        "greeting at offset {}: {}",
        greeting.offset(),
        String::from_utf8_lossy(arena.bytes(greeting)?)
    );
    println!("usage: {}", arena.memory_usage());

    let before = arena.checkpoint();
    arena.alloc(1000)?;
    arena.restore(before)?;
    println!("after restore: {} bytes used", arena.used());

    if let Some(stats) = arena.stats() {
        println!("stats: {stats}");
    }
    arena.destroy()?;
    println!();
    Ok(())
}

fn pool_example() -> mal::Result<()> {
    println!("=== Pool ===");
    let mut pool = Pool::new(4096, 64)?;
    println!("{} slots of {} bytes", pool.slot_count(), pool.slot_size());

    let slots: Vec<Slot> = (0..4).map(|_| pool.alloc()).collect::<Result<_, _>>()?;
    pool.free(slots[1])?;
    let reused = pool.alloc()?;
    println!("freed slot {} and got slot {} back", slots[1].index(), reused.index());

    pool.reset();
    println!("after reset: {} taken, first slot {}", pool.taken(), pool.alloc()?.index());
    pool.destroy()?;
    println!();
    Ok(())
}

fn stack_example() -> mal::Result<()> {
    println!("=== Stacks ===");
    let mut fixed = FixedStack::new(4096, 256)?;
    fixed.alloc()?;
    let top = fixed.alloc()?;
    fixed.release(top)?;
    println!("fixed stack: {} of {} slots taken", fixed.taken(), fixed.slot_count());

    let mut stack = VariableStack::new(4096)?;
    let outer = stack.alloc(100)?;
    let inner = stack.alloc(24)?;
    println!("variable stack: depth {}, {} bytes used", stack.depth(), stack.used());

    match stack.release(outer) {
        Err(e) => println!("out-of-order release rejected: {e}"),
        Ok(()) => unreachable!("outer frame is not on top"),
    }
    stack.release(inner)?;
    stack.release(outer)?;
    println!("variable stack unwound: {} bytes used", stack.used());

    fixed.destroy()?;
    stack.destroy()
}
