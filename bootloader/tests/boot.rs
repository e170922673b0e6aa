use bootloader::{
    BootError, BootSequence,
    config::{BootConfig, EntryPolicy},
    handoff,
    mem::DmaPool,
};
use elf::{
    ElfLoadError, PhysicalMemory, Target,
    testing::{ElfBuilder, ImageBytes, SegmentSpec},
};
use handoff_core::{
    arch::{Alignment, PhysAddr},
    boot::Privilege,
    mem::{DestinationWindow, ReserveError, ranges::MemoryRange},
};
use handoff_hal::{Platform, TransitionFault};
use std::panic::{AssertUnwindSafe, catch_unwind};

const POISON: u8 = 0xEE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    BeforeHandoff,
    DisableInterrupts,
    FlushDataCache,
    DisableDataCache,
    Jump(PhysAddr, Privilege),
    Fatal(TransitionFault),
}

/// Panic payload standing for a successful jump
#[derive(Debug)]
struct Jumped(PhysAddr);

/// Records the handoff steps instead of performing them
#[derive(Default)]
struct SimPlatform {
    events: Vec<Event>,
    /// Fault reported by the jump, if any
    jump_fault: Option<TransitionFault>,
    /// Fault reported by the pre-flight check, if any
    check_fault: Option<TransitionFault>,
}

impl Platform for SimPlatform {
    fn before_handoff(&mut self) {
        self.events.push(Event::BeforeHandoff);
    }

    fn check_transition(&self, _level: Privilege) -> Result<(), TransitionFault> {
        self.check_fault.map_or(Ok(()), Err)
    }

    fn disable_interrupts(&mut self) {
        self.events.push(Event::DisableInterrupts);
    }

    fn flush_data_cache(&mut self) {
        self.events.push(Event::FlushDataCache);
    }

    fn disable_data_cache(&mut self) {
        self.events.push(Event::DisableDataCache);
    }

    unsafe fn jump_with_privilege_change(
        &mut self,
        entry: PhysAddr,
        level: Privilege,
    ) -> TransitionFault {
        self.events.push(Event::Jump(entry, level));
        match self.jump_fault {
            Some(fault) => fault,
            None => std::panic::panic_any(Jumped(entry)),
        }
    }

    fn fatal(&mut self, fault: TransitionFault) -> ! {
        self.events.push(Event::Fatal(fault));
        panic!("fatal: {fault}");
    }
}

/// Mock physical memory backing a single window
struct MockMemory {
    base: PhysAddr,
    bytes: Vec<u8>,
}

impl MockMemory {
    fn new(window: &DestinationWindow) -> Self {
        Self {
            base: window.base(),
            bytes: vec![POISON; usize::try_from(window.size()).unwrap()],
        }
    }

    fn slice_mut(&mut self, dest: PhysAddr, len: u64) -> Option<&mut [u8]> {
        let start = usize::try_from(dest.offset_from(self.base)?).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.bytes.get_mut(start..end)
    }
}

impl PhysicalMemory for MockMemory {
    fn write(&mut self, dest: PhysAddr, src: &[u8]) -> core::result::Result<(), ()> {
        self.slice_mut(dest, src.len() as u64)
            .ok_or(())?
            .copy_from_slice(src);
        Ok(())
    }

    fn fill(&mut self, dest: PhysAddr, size: u64, value: u8) -> core::result::Result<(), ()> {
        self.slice_mut(dest, size).ok_or(())?.fill(value);
        Ok(())
    }
}

fn config() -> BootConfig {
    BootConfig::DEFAULT
        .with_target(Target::X86_64)
        .with_dma_pool(PhysAddr::new(0x1000), 0x1_0000)
        .unwrap()
        .with_window(0x1000, Alignment::PAGE)
}

fn scenario_image() -> ImageBytes {
    ElfBuilder::new(Target::X86_64, 0x1000)
        .ph_offset(0x80)
        .segment(SegmentSpec::load(0x1000, &[0x42; 16], 32).at_offset(0x40))
        .build()
}

const HANDOFF: [Event; 4] = [
    Event::BeforeHandoff,
    Event::DisableInterrupts,
    Event::FlushDataCache,
    Event::DisableDataCache,
];

#[test]
fn scenario_loads_and_jumps_to_entry() {
    let image = scenario_image();
    let mut pool = DmaPool::<4>::new(config().dma_pool);

    let sequence = BootSequence::new(config());
    let window = sequence.reserve_window(&mut pool).unwrap();
    assert_eq!(window.base(), PhysAddr::new(0x1000));
    assert_eq!(window.size(), 0x1000);

    let mut memory = MockMemory::new(&window);
    let loaded = sequence
        .parse(&image)
        .unwrap()
        .load(&window, &mut memory)
        .unwrap();

    assert_eq!(&memory.bytes[0..16], &[0x42; 16]);
    assert_eq!(&memory.bytes[16..32], &[0; 16]);
    assert!(memory.bytes[32..].iter().all(|&b| b == POISON));

    let mut platform = SimPlatform::default();
    let payload = catch_unwind(AssertUnwindSafe(|| unsafe {
        let _ = loaded.transfer(&mut platform);
    }))
    .unwrap_err();

    let jumped = payload.downcast::<Jumped>().expect("jump reached");
    assert_eq!(jumped.0, PhysAddr::new(0x1000));

    let mut expected = HANDOFF.to_vec();
    expected.push(Event::Jump(PhysAddr::new(0x1000), Privilege::Kernel));
    assert_eq!(platform.events, expected);
}

#[test]
fn small_window_overflows_and_stays_untouched() {
    let image = scenario_image();
    let window = DestinationWindow::new(PhysAddr::new(0x1000), 8).unwrap();
    let mut memory = MockMemory::new(&window);

    let err = BootSequence::new(config())
        .parse(&image)
        .unwrap()
        .load(&window, &mut memory)
        .unwrap_err();

    assert_eq!(err, BootError::Image(ElfLoadError::WindowOverflow));
    assert_eq!(memory.bytes, [POISON; 8]);
}

#[test]
fn faulting_jump_is_fatal() {
    let image = scenario_image();
    let window = DestinationWindow::new(PhysAddr::new(0x1000), 0x1000).unwrap();
    let mut memory = MockMemory::new(&window);
    let loaded = BootSequence::new(config().with_privilege(Privilege::Hypervisor))
        .parse(&image)
        .unwrap()
        .load(&window, &mut memory)
        .unwrap();

    let mut platform = SimPlatform {
        jump_fault: Some(TransitionFault::Exception(4)),
        ..SimPlatform::default()
    };
    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        let _ = loaded.transfer(&mut platform);
    }));

    assert!(result.is_err());
    let mut expected = HANDOFF.to_vec();
    expected.push(Event::Jump(PhysAddr::new(0x1000), Privilege::Hypervisor));
    expected.push(Event::Fatal(TransitionFault::Exception(4)));
    assert_eq!(platform.events, expected);
}

#[test]
#[should_panic(expected = "fatal: Entry address is not reachable")]
fn transfer_reports_fault_to_fatal_handler() {
    let mut platform = SimPlatform {
        jump_fault: Some(TransitionFault::UnreachableEntry),
        ..SimPlatform::default()
    };
    unsafe { handoff::transfer(&mut platform, PhysAddr::new(0x1000), Privilege::Kernel) }
}

fn trampoline_image() -> ImageBytes {
    ElfBuilder::new(Target::X86_64, 0x1800)
        .segment(SegmentSpec::load(0x1000, &[0x90; 0x10], 0x100))
        .build()
}

#[test]
fn entry_outside_image_is_refused_by_default() {
    let image = trampoline_image();
    let window = DestinationWindow::new(PhysAddr::new(0x1000), 0x1000).unwrap();
    let mut memory = MockMemory::new(&window);
    let loaded = BootSequence::new(config())
        .parse(&image)
        .unwrap()
        .load(&window, &mut memory)
        .unwrap();

    let mut platform = SimPlatform::default();
    let err = unsafe { loaded.transfer(&mut platform) }.unwrap_err();

    assert_eq!(err, BootError::EntryOutOfRange(PhysAddr::new(0x1800)));
    assert!(platform.events.is_empty());
}

#[test]
fn trusted_trampoline_is_jumped_to() {
    let image = trampoline_image();
    let window = DestinationWindow::new(PhysAddr::new(0x1000), 0x1000).unwrap();
    let mut memory = MockMemory::new(&window);
    let loaded = BootSequence::new(config().with_entry_policy(EntryPolicy::TrustTrampoline))
        .parse(&image)
        .unwrap()
        .load(&window, &mut memory)
        .unwrap();

    let mut platform = SimPlatform::default();
    let payload = catch_unwind(AssertUnwindSafe(|| unsafe {
        let _ = loaded.transfer(&mut platform);
    }))
    .unwrap_err();

    assert_eq!(
        payload.downcast::<Jumped>().expect("jump reached").0,
        PhysAddr::new(0x1800)
    );
}

#[test]
fn refused_privilege_is_recoverable() {
    let image = scenario_image();
    let window = DestinationWindow::new(PhysAddr::new(0x1000), 0x1000).unwrap();
    let mut memory = MockMemory::new(&window);
    let loaded = BootSequence::new(config().with_privilege(Privilege::Hypervisor))
        .parse(&image)
        .unwrap()
        .load(&window, &mut memory)
        .unwrap();

    let fault = TransitionFault::UnsupportedPrivilege(Privilege::Hypervisor);
    let mut platform = SimPlatform {
        check_fault: Some(fault),
        ..SimPlatform::default()
    };
    let err = unsafe { loaded.transfer(&mut platform) }.unwrap_err();

    assert_eq!(err, BootError::PrivilegeTransition(fault));
    assert!(platform.events.is_empty());
}

#[test]
fn invalid_image_is_reported() {
    let mut image = scenario_image();
    image[0] = 0;

    let err = BootSequence::new(config()).parse(&image).unwrap_err();
    assert_eq!(err, BootError::Image(ElfLoadError::MalformedContainer));

    let err = BootSequence::new(config().with_target(Target::AARCH64))
        .parse(&scenario_image())
        .unwrap_err();
    assert_eq!(err, BootError::Image(ElfLoadError::MalformedContainer));
}

#[test]
fn window_reservation_failures() {
    let sequence = BootSequence::new(config().with_window(0x10_0000, Alignment::PAGE));
    let mut pool = DmaPool::<4>::new(MemoryRange::new(0x1000, 0x1_0FFF));

    assert_eq!(
        sequence.reserve_window(&mut pool).unwrap_err(),
        BootError::Reserve(ReserveError::OutOfMemory)
    );

    let sequence = BootSequence::new(config().with_window(0, Alignment::PAGE));
    assert_eq!(
        sequence.reserve_window(&mut pool).unwrap_err(),
        BootError::Reserve(ReserveError::InvalidSize)
    );
}

#[test]
fn parsed_image_is_exposed() {
    let image = scenario_image();
    let parsed = BootSequence::new(config()).parse(&image).unwrap();

    assert_eq!(parsed.image().entry(), PhysAddr::new(0x1000));
    assert_eq!(parsed.image().segments().len(), 1);
    assert_eq!(parsed.config().window_size, 0x1000);
}
