//! AST to bytecode translation.

use tracing::{debug, trace};

use super::{TranslateError, TranslateErrorKind};
use crate::ast::{Literal, Node, NodeKind, SelectForm, Span};
use crate::bytecode::{Bytecode, Constant, ConstantId, Instruction, ValueId};
use crate::stdlib::Environment;
use crate::values::{is_identifier_shaped, static_convention};

type Result<T> = core::result::Result<T, TranslateError>;

/// Translate a program into bytecode.
///
/// The root must be an expression list. Free names resolve against
/// `environment`. The returned unit carries a default checksum.
pub fn translate(root: &Node, environment: &Environment) -> Result<Bytecode> {
    let NodeKind::ExpressionList(items) = &root.kind else {
        return Err(TranslateError::new(
            TranslateErrorKind::InvalidRootExpression,
            root.span.clone(),
        ));
    };

    let mut translator = Translator::new(environment);
    translator.translate_list(items, &root.span, true)?;
    let constants = finalize_constants(translator.constants)
        .map_err(|kind| TranslateError::new(kind, root.span.clone()))?;

    debug!(
        constants = constants.len(),
        instructions = translator.instructions.len(),
        "translated program"
    );
    Ok(Bytecode {
        checksum: Default::default(),
        constants,
        instructions: translator.instructions,
    })
}

/// Lay out the interned constants by id. Every id below the map's size
/// must be present.
pub fn finalize_constants(
    map: hashbrown::HashMap<Constant, ConstantId>,
) -> core::result::Result<Vec<Constant>, TranslateErrorKind> {
    let mut pool: Vec<Option<Constant>> = vec![None; map.len()];
    for (constant, id) in map {
        if let Some(slot) = pool.get_mut(id as usize) {
            *slot = Some(constant);
        }
    }
    pool.into_iter()
        .enumerate()
        .map(|(index, constant)| {
            constant.ok_or(TranslateErrorKind::NonexhaustiveConstantIdMap {
                index: index as ConstantId,
            })
        })
        .collect()
}

/// Names and materialized constants of one function body (or the root).
struct Scope {
    identifiers: hashbrown::HashMap<String, ValueId>,
    constants: hashbrown::HashMap<ConstantId, ValueId>,
    next_value_id: ValueId,
    last_allocated: Option<ValueId>,
}

impl Scope {
    fn new(first_value_id: ValueId) -> Self {
        Self {
            identifiers: hashbrown::HashMap::new(),
            constants: hashbrown::HashMap::new(),
            next_value_id: first_value_id,
            last_allocated: None,
        }
    }

    fn allocate(&mut self) -> ValueId {
        let id = self.next_value_id;
        self.next_value_id += 1;
        self.last_allocated = Some(id);
        id
    }
}

struct Translator<'e> {
    environment: &'e Environment,
    scopes: Vec<Scope>,
    constants: hashbrown::HashMap<Constant, ConstantId>,
    instructions: Vec<Instruction>,
}

impl<'e> Translator<'e> {
    fn new(environment: &'e Environment) -> Self {
        Self {
            environment,
            scopes: vec![Scope::new(0)],
            constants: hashbrown::HashMap::new(),
            instructions: Vec::new(),
        }
    }

    fn scope(&mut self) -> &mut Scope {
        // The root scope is pushed in `new` and never popped.
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn emit(&mut self, instruction: Instruction) {
        trace!(?instruction, "emit");
        self.instructions.push(instruction);
    }

    /// Emit a value-producing instruction and return the id it defines.
    fn emit_value(&mut self, instruction: Instruction) -> ValueId {
        self.emit(instruction);
        self.scope().allocate()
    }

    fn intern(&mut self, constant: Constant) -> ConstantId {
        let next = self.constants.len() as ConstantId;
        *self.constants.entry(constant).or_insert(next)
    }

    fn resolve(&self, name: &str, span: &Span) -> Result<ValueId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.identifiers.get(name).copied())
            .or_else(|| self.environment.id_of(name))
            .ok_or_else(|| {
                TranslateError::new(
                    TranslateErrorKind::UnknownValue {
                        name: name.to_string(),
                    },
                    span.clone(),
                )
            })
    }

    fn translate(&mut self, node: &Node) -> Result<ValueId> {
        match &node.kind {
            NodeKind::Literal(literal) => Ok(self.translate_literal(literal)),
            NodeKind::Identifier(name) => self.resolve(name, &node.span),
            NodeKind::Assignment { names, value } => self.translate_assignment(names, value, &node.span),
            NodeKind::Call { callee, args } => self.translate_call(callee, args),
            NodeKind::Select { value, field, form } => {
                self.translate_select(value, field, *form, &node.span)
            }
            NodeKind::Function { name, .. } => Err(TranslateError::new(
                TranslateErrorKind::MisplacedFunctionDeclaration { name: name.clone() },
                node.span.clone(),
            )),
            NodeKind::ExpressionList(items) => self.translate_list(items, &node.span, false),
        }
    }

    fn translate_literal(&mut self, literal: &Literal) -> ValueId {
        let constant = match literal {
            Literal::Int(i) => Constant::integer(*i),
            Literal::Float(x) => Constant::float(*x),
            Literal::Str(s) => Constant::string(s),
        };
        let id = self.intern(constant);
        if let Some(&value) = self.scope().constants.get(&id) {
            return value;
        }
        let value = self.emit_value(Instruction::ValueFromConstant(id));
        self.scope().constants.insert(id, value);
        value
    }

    /// Every name is checked before any is bound, so a failed assignment
    /// leaves the scope untouched.
    fn translate_assignment(&mut self, names: &[String], value: &Node, span: &Span) -> Result<ValueId> {
        let value = self.translate(value)?;

        for (i, name) in names.iter().enumerate() {
            let repeated = names[..i].contains(name);
            if repeated || self.scope().identifiers.contains_key(name) {
                return Err(TranslateError::new(
                    TranslateErrorKind::ValueReassigned { name: name.clone() },
                    span.clone(),
                ));
            }
        }

        let scope = self.scope();
        for name in names {
            scope.identifiers.insert(name.clone(), value);
        }
        Ok(value)
    }

    fn translate_call(&mut self, callee: &Node, args: &[Node]) -> Result<ValueId> {
        let callee = self.translate(callee)?;
        let mut arg_ids = Vec::with_capacity(args.len());
        for arg in args {
            arg_ids.push(self.translate(arg)?);
        }
        // Arguments are pushed only once all of them exist, so the call's
        // block is contiguous.
        for id in arg_ids {
            self.emit(Instruction::PushArgument(id));
        }
        Ok(self.emit_value(Instruction::ValueFromCall(callee)))
    }

    fn translate_select(
        &mut self,
        value: &Node,
        field: &str,
        form: SelectForm,
        span: &Span,
    ) -> Result<ValueId> {
        let value = self.translate(value)?;

        match static_convention(field) {
            Some(convention) if !convention.admits(form) => {
                return Err(TranslateError::new(
                    TranslateErrorKind::MethodCalledImproperly {
                        field: field.to_string(),
                        form,
                    },
                    span.clone(),
                ));
            }
            Some(_) => {}
            None if form == SelectForm::Normal && is_identifier_shaped(field) => {}
            None => {
                return Err(TranslateError::new(
                    TranslateErrorKind::UnknownField {
                        field: field.to_string(),
                    },
                    span.clone(),
                ));
            }
        }

        let field = self.intern(Constant::string(field));
        Ok(self.emit_value(Instruction::ValueFromStructValue { value, field, form }))
    }

    /// Translate a statement list.
    ///
    /// In the root or a function body (`declarations` set), functions
    /// declared directly in the list get their ids first, so any statement
    /// or sibling function can refer to them. Anywhere else a declaration
    /// is rejected.
    fn translate_list(&mut self, items: &[Node], span: &Span, declarations: bool) -> Result<ValueId> {
        let mut hoisted = Vec::new();
        if declarations {
            for item in items {
                let NodeKind::Function { name, .. } = &item.kind else {
                    continue;
                };
                if self.scope().identifiers.contains_key(name) {
                    return Err(TranslateError::new(
                        TranslateErrorKind::ValueReassigned { name: name.clone() },
                        item.span.clone(),
                    ));
                }
                let id = self.scope().allocate();
                self.scope().identifiers.insert(name.clone(), id);
                hoisted.push(id);
            }
        }

        let mut declared = 0;
        let mut last = None;
        for item in items {
            let id = match &item.kind {
                NodeKind::Function { params, body, .. } if declarations => {
                    self.translate_function(params, body, &item.span)?;
                    declared += 1;
                    hoisted[declared - 1]
                }
                _ => self.translate(item)?,
            };
            last = Some((id, item));
        }

        match last {
            None => {
                let unit = self.environment.id_of("unit").ok_or_else(|| {
                    TranslateError::new(
                        TranslateErrorKind::UnknownValue {
                            name: "unit".to_string(),
                        },
                        span.clone(),
                    )
                })?;
                Ok(self.emit_value(Instruction::ValueCopy(unit)))
            }
            Some((id, item)) => {
                let is_identifier = matches!(item.kind, NodeKind::Identifier(_));
                if is_identifier || self.scope().last_allocated != Some(id) {
                    Ok(self.emit_value(Instruction::ValueCopy(id)))
                } else {
                    Ok(id)
                }
            }
        }
    }

    fn translate_function(&mut self, params: &[String], body: &Node, span: &Span) -> Result<()> {
        self.emit(Instruction::PushFunction(params.len() as u32));

        let mut scope = Scope::new(self.scope().next_value_id);
        for (i, param) in params.iter().enumerate() {
            if params[..i].contains(param) {
                return Err(TranslateError::new(
                    TranslateErrorKind::ValueReassigned {
                        name: param.clone(),
                    },
                    span.clone(),
                ));
            }
            let id = scope.allocate();
            scope.identifiers.insert(param.clone(), id);
        }
        // Parameters are not produced by any instruction.
        scope.last_allocated = None;
        self.scopes.push(scope);

        let result = match &body.kind {
            NodeKind::ExpressionList(items) => self.translate_list(items, &body.span, true),
            _ => self.translate_list(core::slice::from_ref(body), &body.span, true),
        };
        self.scopes.pop();
        result?;

        self.emit(Instruction::PopFunction);
        Ok(())
    }
}
