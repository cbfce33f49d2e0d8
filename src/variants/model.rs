use std::fmt;

/// Shown in a slot whose text came out empty after trimming.
pub const GENERATION_ERROR_PLACEHOLDER: &str = "生成中發生錯誤";
pub const SECOND_UNPARSED_PLACEHOLDER: &str = "無法解析第二個選項";
pub const THIRD_UNPARSED_PLACEHOLDER: &str = "無法解析第三個選項";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionSlot {
    First,
    Second,
    Third,
}

impl OptionSlot {
    pub const ALL: [OptionSlot; 3] = [OptionSlot::First, OptionSlot::Second, OptionSlot::Third];

    pub fn index(self) -> usize {
        match self {
            OptionSlot::First => 0,
            OptionSlot::Second => 1,
            OptionSlot::Third => 2,
        }
    }

    /// One-based number as it appears in labels and output ids.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(OptionSlot::First),
            2 => Some(OptionSlot::Second),
            3 => Some(OptionSlot::Third),
            _ => None,
        }
    }

    /// Logical id of the display region, `output1` to `output3`.
    pub fn output_id(self) -> String {
        format!("output{}", self.number())
    }
}

impl fmt::Display for OptionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option {}", self.number())
    }
}

/// Three display strings recovered from one backend blob. None of them is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVariants([String; 3]);

impl ParsedVariants {
    pub(crate) fn from_finalized(texts: [String; 3]) -> Self {
        debug_assert!(texts.iter().all(|t| !t.is_empty()));
        Self(texts)
    }

    pub fn get(&self, slot: OptionSlot) -> &str {
        &self.0[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionSlot, &str)> + '_ {
        OptionSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    pub fn as_array(&self) -> &[String; 3] {
        &self.0
    }

    pub fn into_array(self) -> [String; 3] {
        self.0
    }
}

/// Which fallback tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    ErrorShortCircuit,
    Labeled,
    Numbered,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub variants: ParsedVariants,
    pub tier: ParseTier,
}
