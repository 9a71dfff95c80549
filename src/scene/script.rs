// src/scene/script.rs
//
// Loads and drives a Rhai scene script. The script may define an
// optional `setup()` returning a state map and must define `frame(ani)`.
// The state map is bound as `this` inside `frame`, so mutations persist
// across frames; reloading the script rebuilds the state from scratch.

use std::path::{Path, PathBuf};

use rhai::{CallFnOptions, Dynamic, Engine, Map, Scope, AST};

use crate::canvas::FrameCanvas;
use crate::error::{AnimakeError, Result};

use super::api::{self, CanvasHandle};

pub struct SceneScript {
    engine: Engine,
    ast: AST,
    state: Dynamic,
    path: PathBuf,
    broken: bool,
}

impl SceneScript {
    /// Reads, compiles and initializes the script at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut engine = Engine::new();
        api::register_api(&mut engine);

        let ast = engine
            .compile_file(path.to_path_buf())
            .map_err(|e| AnimakeError::script(format!("{}: {e}", path.display())))?;

        if !ast.iter_functions().any(|f| f.name == "frame") {
            return Err(AnimakeError::script(format!(
                "{}: script must define a frame(ani) function",
                path.display()
            )));
        }

        // Top-level statements run once here, like a module import.
        // setup() provides the initial state map when present.
        let mut scope = Scope::new();
        let state = if ast.iter_functions().any(|f| f.name == "setup") {
            engine
                .call_fn::<Dynamic>(&mut scope, &ast, "setup", ())
                .map_err(|e| AnimakeError::script(format!("{}: setup: {e}", path.display())))?
        } else {
            engine
                .run_ast_with_scope(&mut scope, &ast)
                .map_err(|e| AnimakeError::script(format!("{}: {e}", path.display())))?;
            Dynamic::from(Map::new())
        };

        Ok(Self {
            engine,
            ast,
            state,
            path: path.to_path_buf(),
            broken: false,
        })
    }

    /// A script becomes broken when a frame call errors at runtime; it is
    /// then skipped until the next reload.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Runs `frame(ani)` against the given canvas. Recorded commands are
    /// written back into `canvas` on success.
    pub fn run_frame(&mut self, canvas: &mut FrameCanvas) -> Result<()> {
        if self.broken {
            return Ok(());
        }

        let handle = CanvasHandle::new(std::mem::take(canvas));
        let mut this = std::mem::take(&mut self.state);

        let mut scope = Scope::new();
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut this);
        let result = self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut scope,
            &self.ast,
            "frame",
            (handle.clone(),),
        );

        self.state = this;
        *canvas = handle.take();

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.broken = true;
                Err(AnimakeError::script(format!(
                    "{}: frame {}: {e}",
                    self.path.display(),
                    canvas.frame()
                )))
            }
        }
    }
}
