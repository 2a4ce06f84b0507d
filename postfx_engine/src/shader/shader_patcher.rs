/// Line-based GLSL source editor
///
/// Lets pass authors inject defines, shared snippets and hook functions into
/// an existing shader without templating. Insertions land right after the
/// `#version` line (or at the top of the file) in call order. Blank lines are
/// dropped from the source.
///
/// Hooks are `bool func_<name>()` functions: `before_main` makes `main` return
/// early when the hook returns false, `after_main` calls the hook last.
///
/// # Example
///
/// ```
/// use postfx_engine::postfx::shader::ShaderPatcher;
///
/// let source = ShaderPatcher::new("#version 330 core\nvoid main()\n{\n}\n")
///     .define_value("TAPS", "9")
///     .source();
/// assert!(source.starts_with("#version 330 core\n#define TAPS 9\n"));
/// ```
#[derive(Debug, Clone)]
pub struct ShaderPatcher {
    lines: Vec<String>,
    cursor: usize,
}

impl ShaderPatcher {
    pub fn new(source: &str) -> Self {
        let lines = split_lines(source);
        let cursor = version_line(&lines).map(|i| i + 1).unwrap_or(0);
        Self { lines, cursor }
    }

    /// `#define NAME`
    pub fn define(&mut self, name: &str) -> &mut Self {
        self.add_line(format!("#define {}", name))
    }

    /// `#define NAME VALUE`
    pub fn define_value(&mut self, name: &str, value: &str) -> &mut Self {
        self.add_line(format!("#define {} {}", name, value))
    }

    /// Paste another source, minus its `#version` line
    pub fn include(&mut self, source: &str) -> &mut Self {
        let mut lines = split_lines(source);
        if let Some(index) = version_line(&lines) {
            lines.remove(index);
        }

        self.add_line("// #include start".to_string());
        for line in lines {
            self.add_line(line);
        }
        self.add_line("// #include end".to_string())
    }

    /// Add a `bool func_<name>()` hook with the given body
    pub fn add_function(&mut self, name: &str, code: &str) -> &mut Self {
        self.add_line(format!("bool func_{}()", name));
        self.add_line("{".to_string());
        for line in split_lines(code) {
            self.add_line(line);
        }
        self.add_line("}".to_string())
    }

    /// Call `func_<name>()` first thing in `main`, returning early on false
    pub fn before_main(&mut self, function: &str) -> &mut Self {
        if let Some(open) = main_open_line(&self.lines) {
            self.insert_at(open + 1, format!("if (!func_{}()) return;", function));
        }
        self
    }

    /// Call `func_<name>()` last thing in `main`
    pub fn after_main(&mut self, function: &str) -> &mut Self {
        if let Some(close) = main_close_line(&self.lines) {
            self.insert_at(close, format!("func_{}();", function));
        }
        self
    }

    /// Patched source, one line per `\n`
    pub fn source(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn add_line(&mut self, content: String) -> &mut Self {
        let cursor = self.cursor.min(self.lines.len());
        self.lines.insert(cursor, content);
        self.cursor = cursor + 1;
        self
    }

    fn insert_at(&mut self, index: usize, content: String) {
        self.lines.insert(index, content);
        if index < self.cursor {
            self.cursor += 1;
        }
    }
}

fn split_lines(source: &str) -> Vec<String> {
    source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn version_line(lines: &[String]) -> Option<usize> {
    lines
        .iter()
        .position(|l| l.trim().to_lowercase().starts_with("#version "))
}

fn main_start(lines: &[String]) -> Option<usize> {
    lines
        .iter()
        .position(|l| l.trim().to_lowercase().starts_with("void main("))
}

fn main_open_line(lines: &[String]) -> Option<usize> {
    let start = main_start(lines)?;
    lines[start..]
        .iter()
        .position(|l| l.contains('{'))
        .map(|offset| start + offset)
}

fn main_close_line(lines: &[String]) -> Option<usize> {
    let start = main_start(lines)?;
    let mut depth = 0i32;
    let mut opened = false;
    for (offset, line) in lines[start..].iter().enumerate() {
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return Some(start + offset);
        }
    }
    None
}

#[cfg(test)]
#[path = "shader_patcher_tests.rs"]
mod tests;
