// The first character cannot be a digit, or the name would not be a valid
// CSS identifier (and `#1` would not be a valid id selector).
const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const OTHER_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Returns the `index`-th short name (zero-based).
///
/// Names are ordered by length, then lexicographically within a length using
/// the alphabet order above: `a`..`z`, `aa`..`az`, `a0`..`a9`, `ba`, ... `z9`,
/// `aaa`, and so on.
pub fn short_name(mut index: usize) -> String {
  let mut len = 1;
  let mut block = FIRST_CHARS.len();
  while index >= block {
    index -= block;
    len += 1;
    block = block.saturating_mul(OTHER_CHARS.len());
  }

  let mut buf = vec![0u8; len];
  for pos in (1..len).rev() {
    buf[pos] = OTHER_CHARS[index % OTHER_CHARS.len()];
    index /= OTHER_CHARS.len();
  }
  buf[0] = FIRST_CHARS[index];
  // Both alphabets are ASCII.
  buf.into_iter().map(char::from).collect()
}

/// Infinite sequence of short names in the same order as [`short_name`].
///
/// Each call to [`ShortNames::new`] restarts from `a`.
#[derive(Clone, Debug, Default)]
pub struct ShortNames {
  // Alphabet index per position; empty before the first name is produced.
  digits: Vec<usize>,
}

impl ShortNames {
  pub fn new() -> ShortNames {
    ShortNames::default()
  }

  fn advance(&mut self) {
    if self.digits.is_empty() {
      self.digits.push(0);
      return;
    }
    for pos in (0..self.digits.len()).rev() {
      let radix = if pos == 0 {
        FIRST_CHARS.len()
      } else {
        OTHER_CHARS.len()
      };
      self.digits[pos] += 1;
      if self.digits[pos] < radix {
        return;
      }
      self.digits[pos] = 0;
    }
    // Every position wrapped, so this length is exhausted.
    self.digits.push(0);
  }

  fn render(&self) -> String {
    self
      .digits
      .iter()
      .enumerate()
      .map(|(pos, &d)| {
        if pos == 0 {
          FIRST_CHARS[d] as char
        } else {
          OTHER_CHARS[d] as char
        }
      })
      .collect()
  }
}

impl Iterator for ShortNames {
  type Item = String;

  fn next(&mut self) -> Option<String> {
    self.advance();
    Some(self.render())
  }
}
