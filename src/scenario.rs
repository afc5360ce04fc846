use log::info;

use crate::abi::{self, CChar, Int, Long, ScalarKind, Short, UInt, ULong, UShort};
use crate::block::OpaqueBlock;
use crate::contract::Contract;
use crate::error::ScenarioError;
use crate::journal::{self, Observation};

/// One value of every kind, passed in table order, plus the length of the
/// block whose address is passed last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub char: CChar,
    pub wide_char: char,
    pub short: Short,
    pub unsigned_short: UShort,
    pub int: Int,
    pub unsigned_int: UInt,
    pub long: Long,
    pub unsigned_long: ULong,
    pub block_len: usize,
}

/// A call that completed, with the bit pattern that was sent and, for an
/// observed run, the one the callee reported receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRecord {
    pub kind: ScalarKind,
    pub sent: u64,
    pub received: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    calls: Vec<CallRecord>,
}

impl ScenarioReport {
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    fn push(&mut self, kind: ScalarKind, sent: u64) {
        info!("{} ok ({:#x})", kind, sent);
        self.calls.push(CallRecord {
            kind,
            sent,
            received: None,
        });
    }

    fn attach(&mut self, observed: &[Observation]) -> Result<(), ScenarioError> {
        if observed.len() != self.calls.len() {
            return Err(ScenarioError::ObservationCount {
                expected: self.calls.len(),
                found: observed.len(),
            });
        }
        for (call, seen) in self.calls.iter_mut().zip(observed) {
            if seen.kind != call.kind || seen.bits != call.sent {
                return Err(ScenarioError::Mismatch {
                    kind: call.kind,
                    sent: call.sent,
                    received: seen.bits,
                });
            }
            call.received = Some(seen.bits);
        }
        Ok(())
    }
}

impl Scenario {
    pub fn example() -> Self {
        Self {
            char: b'A' as CChar,
            wide_char: 'ζ',
            short: -100,
            unsigned_short: 100,
            int: -10,
            unsigned_int: 10,
            long: -1000,
            unsigned_long: 1000,
            block_len: 1000,
        }
    }

    /// Issues every call in order. The first failing call stops the run;
    /// the block is released on every path.
    pub fn run(&self, contract: &Contract<'_>) -> Result<ScenarioReport, ScenarioError> {
        let wide = abi::wide_char(self.wide_char)?;
        let block = OpaqueBlock::allocate(self.block_len)?;
        let mut report = ScenarioReport::default();

        contract.pass_char(self.char)?;
        report.push(ScalarKind::Char, self.char as u8 as u64);

        contract.pass_wide_char(wide)?;
        report.push(ScalarKind::WideChar, u64::from(wide));

        contract.pass_short(self.short)?;
        report.push(ScalarKind::Short, self.short as u16 as u64);

        contract.pass_unsigned_short(self.unsigned_short)?;
        report.push(ScalarKind::UnsignedShort, u64::from(self.unsigned_short));

        contract.pass_int(self.int)?;
        report.push(ScalarKind::Int, self.int as u32 as u64);

        contract.pass_unsigned_int(self.unsigned_int)?;
        report.push(ScalarKind::UnsignedInt, u64::from(self.unsigned_int));

        contract.pass_long(self.long)?;
        report.push(ScalarKind::Long, self.long as u64);

        contract.pass_unsigned_long(self.unsigned_long)?;
        report.push(ScalarKind::UnsignedLong, self.unsigned_long);

        contract.pass_pointer(block.as_opaque())?;
        report.push(ScalarKind::Pointer, block.addr() as u64);

        Ok(report)
    }

    /// Like [`Scenario::run`], but also checks that the callee received
    /// exactly the bits that were sent, as reported through the journal.
    pub fn run_observed(&self, contract: &Contract<'_>) -> Result<ScenarioReport, ScenarioError> {
        let (report, observed) = journal::capture(|| self.run(contract));
        let mut report = report?;
        report.attach(&observed)?;
        Ok(report)
    }
}
