use ropey::Rope;

/// The document being edited
pub struct Buffer {
    text: Rope,
    dirty: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            dirty: false,
        }
    }

    #[cfg(test)]
    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
            dirty: false,
        }
    }

    /// Replace the whole document. Clears the dirty flag.
    pub fn replace_all(&mut self, s: &str) {
        self.text = Rope::from_str(s);
        self.dirty = false;
    }

    /// True once the user has edited the text since the last `replace_all`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn line(&self, idx: usize) -> ropey::RopeSlice<'_> {
        self.text.line(idx)
    }

    pub fn line_len(&self, idx: usize) -> usize {
        // Length excluding newline character
        let line = self.text.line(idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Type a full line at the end of the document
    pub fn append_line(&mut self, line: &str) {
        let len = self.text.len_chars();
        if len > 0 && self.text.char(len - 1) != '\n' {
            self.text.insert_char(len, '\n');
        }
        let len = self.text.len_chars();
        self.text.insert(len, line);
        self.text.insert_char(self.text.len_chars(), '\n');
        self.dirty = true;
    }

    /// Delete a line by index, including its newline
    pub fn delete_line(&mut self, idx: usize) -> bool {
        if idx >= self.line_count() || self.text.len_chars() == 0 {
            return false;
        }
        let start = self.text.line_to_char(idx);
        let end = start + self.text.line(idx).len_chars();
        if start == end {
            return false;
        }
        self.text.remove(start..end);
        self.dirty = true;
        true
    }

    pub fn clear(&mut self) {
        if self.text.len_chars() > 0 {
            self.text = Rope::new();
            self.dirty = true;
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.text.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}
