use super::error::EmulatorError;

#[derive(Debug, Clone)]
/// The hardware stack: a fixed ring of bytes living in its own storage, not
/// aliased into [`Memory`](super::memory::Memory).
///
/// `sp` always lies in `bottom..=top`. Pushing more than `size` bytes without
/// popping silently overwrites the oldest slot, which is what the real part
/// does on overflow.
pub struct Stack {
    slots: Vec<u8>,
    top: u16,
    bottom: u16,
    sp: u16,
    /// Pushes not yet matched by a pop, capped at `size`
    live: usize,
}

impl Stack {
    /// `top` is the highest address of the window and `size` its length in
    /// bytes. `size` must be at least 1 and the window must fit below `top`.
    pub fn new(top: u16, size: u16, fill_byte: u8) -> Self {
        assert!(size >= 1 && size - 1 <= top, "stack window out of range");
        Self {
            slots: vec![fill_byte; size as usize],
            top,
            bottom: top - (size - 1),
            sp: top,
            live: 0,
        }
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn top(&self) -> u16 {
        self.top
    }

    pub fn bottom(&self) -> u16 {
        self.bottom
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Entries pushed and not popped since the last pointer reset.
    pub fn live(&self) -> usize {
        self.live
    }

    fn slot(&self) -> usize {
        (self.sp - self.bottom) as usize
    }

    /// Move down one slot (wrapping from bottom to top) then write.
    pub fn push(&mut self, value: u8) {
        self.sp = if self.sp == self.bottom {
            self.top
        } else {
            self.sp - 1
        };
        let slot = self.slot();
        self.slots[slot] = value;
        self.live = (self.live + 1).min(self.size());
        tracing::trace!(
            sp = format!("0x{:04X}", self.sp),
            value = format!("0x{value:02X}"),
            "stack push"
        );
    }

    /// Read the current slot then move up one (wrapping from top to bottom).
    pub fn pop(&mut self) -> u8 {
        let value = self.slots[self.slot()];
        self.sp = if self.sp == self.top {
            self.bottom
        } else {
            self.sp + 1
        };
        self.live = self.live.saturating_sub(1);
        tracing::trace!(
            sp = format!("0x{:04X}", self.sp),
            value = format!("0x{value:02X}"),
            "stack pop"
        );
        value
    }

    pub fn reset_pointer(&mut self, address: u16) -> Result<(), EmulatorError> {
        if !(self.bottom..=self.top).contains(&address) {
            tracing::error!(
                "SP 0x{:04X} outside stack window 0x{:04X}..=0x{:04X}",
                address,
                self.bottom,
                self.top
            );
            return Err(EmulatorError::OperandOutOfRange {
                value: address as u32,
                max: self.top as u32,
            });
        }
        self.sp = address;
        // everything above the new pointer counts as stacked
        self.live = (self.top - address) as usize;
        Ok(())
    }

    /// Back to an empty stack with SP at the top. Slot contents are kept.
    pub fn reset(&mut self) {
        self.sp = self.top;
        self.live = 0;
    }

    /// Opt-in overflow check for debugging harnesses, the ring itself never fails.
    /// Errors if `depth` more pushes would wrap onto entries that are still live.
    pub fn check_depth(&self, depth: usize) -> Result<(), EmulatorError> {
        if self.live + depth > self.size() {
            tracing::warn!(
                live = self.live,
                depth,
                size = self.size(),
                "stack would overwrite live entries"
            );
            return Err(EmulatorError::OperandOutOfRange {
                value: (self.live + depth) as u32,
                max: self.size() as u32,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> Stack {
        Stack::new(0x00FF, 64, 0x9D)
    }

    #[test]
    fn starts_at_top() {
        let stack = stack();
        assert_eq!(stack.sp(), 0x00FF);
        assert_eq!(stack.bottom(), 0x00C0);
        assert_eq!(stack.size(), 64);
    }

    #[test]
    fn push_then_pop_is_lifo() {
        let mut stack = stack();
        for value in 0..64u8 {
            stack.push(value);
        }
        for value in (0..64u8).rev() {
            assert_eq!(stack.pop(), value);
        }
        assert_eq!(stack.sp(), 0x00FF);
    }

    #[test]
    fn ring_overwrites_first_slot_after_size_pushes() {
        let mut stack = stack();
        stack.push(0xAA);
        let first_slot = stack.sp();
        for value in 1..64u8 {
            stack.push(value);
            assert!((stack.bottom()..=stack.top()).contains(&stack.sp()));
        }
        stack.push(0xBB);
        assert_eq!(stack.sp(), first_slot);
        assert_eq!(stack.pop(), 0xBB);
    }

    #[test]
    fn pop_on_fresh_stack_wraps_sp_to_bottom() {
        // The ring wraps top -> bottom, so an unmatched pop lands on `bottom`
        // itself rather than `bottom + 1`. Kept so that `size + 1` pushes
        // always return to the first slot.
        let mut stack = stack();
        assert_eq!(stack.pop(), 0x9D);
        assert_eq!(stack.sp(), 0x00C0);
        assert_ne!(stack.sp(), stack.bottom() + 1);
        assert_eq!(stack.live(), 0);

        stack.push(0x11);
        assert_eq!(stack.sp(), 0x00FF);
        assert_eq!(stack.pop(), 0x11);
    }

    #[test]
    fn reset_pointer_is_bounded() {
        let mut stack = stack();
        stack.reset_pointer(0x00C0).unwrap();
        assert_eq!(stack.sp(), 0x00C0);
        assert!(matches!(
            stack.reset_pointer(0x0100),
            Err(EmulatorError::OperandOutOfRange { .. })
        ));
        assert!(matches!(
            stack.reset_pointer(0x00BF),
            Err(EmulatorError::OperandOutOfRange { .. })
        ));
        assert_eq!(stack.sp(), 0x00C0);
    }

    #[test]
    fn depth_check_counts_live_entries() {
        let mut stack = stack();
        assert!(stack.check_depth(64).is_ok());
        assert!(stack.check_depth(65).is_err());

        for value in 0..63u8 {
            stack.push(value);
        }
        assert!(stack.check_depth(1).is_ok());
        stack.push(63);
        assert_eq!(stack.live(), 64);
        assert_eq!(
            stack.check_depth(1),
            Err(EmulatorError::OperandOutOfRange { value: 65, max: 64 })
        );

        stack.pop();
        assert!(stack.check_depth(1).is_ok());
        assert!(stack.check_depth(2).is_err());
    }

    #[test]
    fn live_count_follows_pointer_moves() {
        let mut stack = stack();
        for _ in 0..70 {
            stack.push(0);
        }
        assert_eq!(stack.live(), 64);

        stack.reset_pointer(0x00FB).unwrap();
        assert_eq!(stack.live(), 4);
        assert!(stack.check_depth(60).is_ok());
        assert!(stack.check_depth(61).is_err());

        stack.reset();
        assert_eq!((stack.sp(), stack.live()), (0x00FF, 0));
    }
}
