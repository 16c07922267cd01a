// Code generation engine for mini-Pascal

use crate::codegen::constants::*;
use crate::codegen::storage::{Storage, StorageMap};
use crate::parser::ast::*;
use crate::symbols::{ArrayBounds, Symbol, SymbolId, SymbolKind, SymbolTable};
use log::{debug, info, warn};

/// Stack frame of the subprogram being generated
#[derive(Debug, Default)]
struct Frame {
    /// Words reserved below the save area
    words: i32,
    /// Offsets of the parameters, in declaration order
    params: Vec<i32>,
    /// Offset of a function's result word
    result: Option<i32>,
    /// Symbols whose storage lives in this frame
    owned: Vec<SymbolId>,
}

/// Walks a [`Program`] and accumulates MIPS assembly
pub struct Generator<'t> {
    /// Names as resolved by the parser; subprogram scopes are re-pushed here
    pub(crate) symbols: &'t mut SymbolTable,

    /// Addresses of every variable currently reachable
    pub(crate) storage: StorageMap,

    /// Output lines, in order
    lines: Vec<String>,

    /// Index into the register pool for the next result
    pub(crate) cursor: usize,

    /// Next `else{N}`/`endIf{N}` number
    pub(crate) if_labels: usize,

    /// Next `while{N}`/`endWhile{N}` number
    pub(crate) while_labels: usize,

    /// Names of the subprograms whose scopes are pushed, outermost first
    path: Vec<String>,

    diagnostics: Vec<String>,
}

impl<'t> Generator<'t> {
    pub fn new(symbols: &'t mut SymbolTable) -> Self {
        Generator {
            symbols,
            storage: StorageMap::new(),
            lines: Vec::new(),
            cursor: 0,
            if_labels: 0,
            while_labels: 0,
            path: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Current register cursor.
    pub fn register_cursor(&self) -> usize {
        self.cursor
    }

    /// Messages for every construct that could not be lowered.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Assembly generated so far.
    pub fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    /// Generate the data section, `main`, and every subprogram after it.
    pub fn generate_program(&mut self, program: &Program) {
        info!("generating code for program '{}'", program.name);

        self.directive(".data");
        self.emit_data(&program.declarations);

        self.directive(".text");
        self.directive(".globl main");
        self.emit_label("main");
        self.emit_compound(&program.body);
        self.emit(format!("li {}, {}", RESULT_REGISTER, SYSCALL_EXIT));
        self.emit("syscall");

        for subprogram in &program.subprograms {
            self.emit_subprogram(subprogram);
        }

        if !self.diagnostics.is_empty() {
            warn!("generated code contains {} error marker(s)", self.diagnostics.len());
        }
    }

    /// Reserve a labelled, zeroed word (or run of words) per global variable.
    pub(crate) fn emit_data(&mut self, declarations: &Declarations) {
        for variable in &declarations.variables {
            let found = self
                .symbols
                .global()
                .get(&variable.name)
                .map(|symbol| (symbol.id(), symbol.array_bounds()));
            let Some((id, bounds)) = found else {
                self.diagnose(format!("global '{}' is missing from the symbol table", variable.name));
                continue;
            };

            let label = format!("_{}", variable.name);
            match bounds {
                Some(bounds) => self.lines.push(format!("{}: .word 0:{}", label, bounds.len())),
                None => self.lines.push(format!("{}: .word 0", label)),
            }
            self.storage.assign(id, Storage::Global(label));
        }
    }

    fn emit_subprogram(&mut self, subprogram: &SubProgram) {
        let found = self
            .symbols
            .lookup_with_depth(&subprogram.name)
            .map(|(depth, symbol)| (depth, symbol.id()));
        let Some((depth, routine)) = found else {
            self.diagnose(format!("subprogram '{}' is missing from the symbol table", subprogram.name));
            return;
        };
        let label = self.subprogram_label(depth, &subprogram.name);

        let Some(scope) = self.symbols.detach_local_scope(&subprogram.name) else {
            self.diagnose(format!("subprogram '{}' has no local scope", subprogram.name));
            return;
        };
        self.symbols.push_scope(scope);
        self.path.push(subprogram.name.clone());

        let mut frame = Frame::default();
        if self.layout_frame(subprogram, routine, &mut frame).is_some() {
            debug!("frame of '{}': {} word(s)", label, frame.words);
            self.emit_frame(subprogram, &label, &frame);
        } else {
            self.diagnose(format!("frame of '{}' exceeds the 32-bit stack offset range", subprogram.name));
            self.emit_label(&label);
            self.emit(format!("jr {}", RETURN_ADDRESS));
        }

        // Nested subprograms cannot address this frame.
        for id in frame.owned {
            self.storage.release(id);
        }
        for nested in &subprogram.subprograms {
            self.emit_subprogram(nested);
        }

        self.path.pop();
        if let Some(scope) = self.symbols.exit_scope() {
            self.symbols.attach_local_scope(&subprogram.name, scope);
        }
    }

    fn emit_frame(&mut self, subprogram: &SubProgram, label: &str, frame: &Frame) {
        let frame_bytes = frame.words * WORD_SIZE;
        self.emit_label(label);
        self.emit_prologue(frame_bytes);
        for (index, offset) in frame.params.iter().enumerate() {
            match ARGUMENT_REGISTERS.get(index) {
                Some(register) => self.emit(format!("sw {}, {}", register, Storage::Stack(*offset))),
                None => self.diagnose(format!(
                    "'{}' takes more than {} arguments",
                    subprogram.name,
                    ARGUMENT_REGISTERS.len()
                )),
            }
        }

        self.emit_compound(&subprogram.body);

        if let Some(offset) = frame.result {
            self.emit(format!("lw {}, {}", RESULT_REGISTER, Storage::Stack(offset)));
        }
        self.emit_epilogue(frame_bytes);
    }

    /// Give parameters, locals and the result word their stack offsets.
    ///
    /// `None` once the frame no longer fits a 32-bit offset; whatever was
    /// claimed so far is still recorded in `frame.owned`.
    fn layout_frame(&mut self, subprogram: &SubProgram, routine: SymbolId, frame: &mut Frame) -> Option<()> {
        for arg in &subprogram.args {
            if let Some(id) = self.local_id(&arg.name) {
                let offset = self.claim(frame, id, 1)?;
                frame.params.push(offset);
            }
        }

        for variable in &subprogram.declarations.variables {
            let found = self
                .symbols
                .current()
                .get(&variable.name)
                .map(|symbol| (symbol.id(), symbol.array_bounds()));
            if let Some((id, bounds)) = found {
                let words = bounds.map_or(1, |bounds| bounds.len());
                self.claim(frame, id, words)?;
            }
        }

        if subprogram.kind == SubProgramKind::Function {
            frame.result = Some(self.claim(frame, routine, 1)?);
        }

        Some(())
    }

    /// Reserve `words` words for `id` and return its offset.
    fn claim(&mut self, frame: &mut Frame, id: SymbolId, words: usize) -> Option<i32> {
        let offset = frame.words.checked_mul(WORD_SIZE)?;
        let end = i32::try_from(words).ok().and_then(|words| frame.words.checked_add(words))?;
        end.checked_mul(WORD_SIZE)?;

        self.storage.assign(id, Storage::Stack(offset));
        frame.owned.push(id);
        frame.words = end;
        Some(offset)
    }

    fn local_id(&self, name: &str) -> Option<SymbolId> {
        self.symbols.current().get(name).map(Symbol::id)
    }

    fn emit_prologue(&mut self, frame_bytes: i32) {
        self.emit(format!("addi {sp}, {sp}, -{}", SAVE_AREA_SIZE, sp = STACK_POINTER));
        for (index, register) in REGISTER_POOL.iter().enumerate() {
            self.emit(format!("sw {}, {}", register, Storage::Stack(index as i32 * WORD_SIZE)));
        }
        self.emit(format!("sw {}, {}", RETURN_ADDRESS, Storage::Stack(SAVE_AREA_SIZE - WORD_SIZE)));
        if frame_bytes > 0 {
            self.emit(format!("addi {sp}, {sp}, -{}", frame_bytes, sp = STACK_POINTER));
        }
    }

    fn emit_epilogue(&mut self, frame_bytes: i32) {
        if frame_bytes > 0 {
            self.emit(format!("addi {sp}, {sp}, {}", frame_bytes, sp = STACK_POINTER));
        }
        for (index, register) in REGISTER_POOL.iter().enumerate() {
            self.emit(format!("lw {}, {}", register, Storage::Stack(index as i32 * WORD_SIZE)));
        }
        self.emit(format!("lw {}, {}", RETURN_ADDRESS, Storage::Stack(SAVE_AREA_SIZE - WORD_SIZE)));
        self.emit(format!("addi {sp}, {sp}, {}", SAVE_AREA_SIZE, sp = STACK_POINTER));
        self.emit(format!("jr {}", RETURN_ADDRESS));
    }

    // ===== Helper methods =====

    /// Label of a subprogram declared at scope `depth` (1 is global):
    /// `_outer_inner` for `inner` nested in `outer`.
    pub(crate) fn subprogram_label(&self, depth: usize, name: &str) -> String {
        let mut parts: Vec<&str> = self
            .path
            .iter()
            .take(depth.saturating_sub(1))
            .map(String::as_str)
            .collect();
        parts.push(name);
        format!("_{}", parts.join("_"))
    }

    /// Storage of a variable, array or function result visible by `name`.
    pub(crate) fn locate(&mut self, name: &str) -> Option<(Storage, Option<ArrayBounds>)> {
        let found = self
            .symbols
            .lookup(name)
            .map(|symbol| (symbol.id(), symbol.kind(), symbol.array_bounds()));
        let Some((id, kind, bounds)) = found else {
            self.diagnose(format!("'{}' is not declared", name));
            return None;
        };

        match self.storage.get(id) {
            Some(storage) => Some((storage.clone(), bounds)),
            None if kind == SymbolKind::Function => {
                self.diagnose(format!("result of '{}' is not addressable here", name));
                None
            }
            None => {
                self.diagnose(format!(
                    "'{}' lives in an enclosing subprogram's frame and cannot be reached",
                    name
                ));
                None
            }
        }
    }

    /// Register at `index` in the pool.
    ///
    /// Running past the pool is reported and the last register is reused, so
    /// the output stays well-formed but wrong.
    pub(crate) fn register(&mut self, index: usize) -> &'static str {
        match REGISTER_POOL.get(index) {
            Some(&register) => register,
            None => {
                self.diagnose(format!(
                    "expression needs more than {} registers",
                    REGISTER_POOL.len()
                ));
                REGISTER_POOL[REGISTER_POOL.len() - 1]
            }
        }
    }

    pub(crate) fn emit(&mut self, instruction: impl AsRef<str>) {
        self.lines.push(format!("    {}", instruction.as_ref()));
    }

    pub(crate) fn emit_label(&mut self, label: &str) {
        self.lines.push(format!("{}:", label));
    }

    fn directive(&mut self, directive: &str) {
        self.lines.push(directive.to_string());
    }

    /// Record a construct that could not be lowered and mark the output.
    pub(crate) fn diagnose(&mut self, message: String) {
        warn!("{}", message);
        self.lines.push(format!("# ERROR: {}", message));
        self.diagnostics.push(message);
    }
}
