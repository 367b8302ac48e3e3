//! Child containers with parent bookkeeping.
//!
//! A container owns its children outright. Adding a child records the
//! container's [`NodeId`] as the child's parent; removing it clears the link.

use indexmap::IndexMap;

use super::elements::{AasSubmodelElements, SubmodelElement};
use super::error::{Constraint, ModelError};
use super::referable::NodeId;
use super::value::DataTypeDefXsd;

/// Children addressed by id-short, unique among siblings.
///
/// Used for submodels, collections, entity statements and relationship
/// annotations. Equality ignores child order.
#[derive(Clone, Debug)]
pub struct NamedElements {
    owner: NodeId,
    data_only: bool,
    items: IndexMap<String, SubmodelElement>,
}

impl NamedElements {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self {
            owner,
            data_only: false,
            items: IndexMap::new(),
        }
    }

    /// A container that only admits data elements.
    pub(crate) fn data_elements(owner: NodeId) -> Self {
        Self {
            data_only: true,
            ..Self::new(owner)
        }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Add a child. Fails if the id-short is missing or taken.
    pub fn add(&mut self, mut element: SubmodelElement) -> Result<(), ModelError> {
        let Some(id_short) = element.id_short().map(str::to_string) else {
            return Err(ModelError::violation(
                Constraint::IdShortRequired,
                format!("{} without id-short cannot be added here", element.kind()),
            ));
        };
        if self.data_only && !element.kind().is_data_element() {
            return Err(ModelError::violation(
                Constraint::AnnotationDataElement,
                format!("annotation `{id_short}` is a {}", element.kind()),
            ));
        }
        if self.items.contains_key(&id_short) {
            return Err(ModelError::violation(
                Constraint::IdShortUnique,
                format!("id-short `{id_short}` is already used by a sibling"),
            ));
        }
        element.set_parent(Some(self.owner));
        self.items.insert(id_short, element);
        Ok(())
    }

    /// Detach a child by id-short.
    pub fn remove(&mut self, id_short: &str) -> Option<SubmodelElement> {
        let mut element = self.items.shift_remove(id_short)?;
        element.set_parent(None);
        Some(element)
    }

    pub fn get(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.items.get(id_short)
    }

    pub fn get_mut(&mut self, id_short: &str) -> Option<&mut SubmodelElement> {
        self.items.get_mut(id_short)
    }

    pub fn contains(&self, id_short: &str) -> bool {
        self.items.contains_key(id_short)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubmodelElement> {
        self.items.values()
    }

    /// Children with the key they are filed under.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &SubmodelElement)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for NamedElements {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// Ordered, homogeneously typed children addressed by position.
#[derive(Clone, Debug)]
pub struct ListItems {
    owner: NodeId,
    element_type: AasSubmodelElements,
    value_type: Option<DataTypeDefXsd>,
    items: Vec<SubmodelElement>,
}

impl ListItems {
    pub(crate) fn new(
        owner: NodeId,
        element_type: AasSubmodelElements,
        value_type: Option<DataTypeDefXsd>,
    ) -> Self {
        Self {
            owner,
            element_type,
            value_type,
            items: Vec::new(),
        }
    }

    pub fn element_type(&self) -> AasSubmodelElements {
        self.element_type
    }

    pub fn value_type(&self) -> Option<DataTypeDefXsd> {
        self.value_type
    }

    fn admit(&self, element: &SubmodelElement) -> Result<(), ModelError> {
        if !self.element_type.matches(element.kind()) {
            return Err(ModelError::violation(
                Constraint::ListElementType,
                format!("{} in a list of {}", element.kind(), self.element_type),
            ));
        }
        if let Some(found) = element.value_type() {
            if self.value_type != Some(found) {
                return Err(ModelError::violation(
                    Constraint::ListValueType,
                    format!(
                        "{found} item in a list of {}",
                        self.value_type.map_or("untyped values", |t| t.as_str())
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn push(&mut self, mut element: SubmodelElement) -> Result<(), ModelError> {
        self.admit(&element)?;
        element.set_parent(Some(self.owner));
        self.items.push(element);
        Ok(())
    }

    /// Insert at `index`, shifting later items. `index` may equal `len()`.
    pub fn insert(&mut self, index: usize, mut element: SubmodelElement) -> Result<(), ModelError> {
        if index > self.items.len() {
            return Err(ModelError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.admit(&element)?;
        element.set_parent(Some(self.owner));
        self.items.insert(index, element);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<SubmodelElement> {
        if index >= self.items.len() {
            return None;
        }
        let mut element = self.items.remove(index);
        element.set_parent(None);
        Some(element)
    }

    pub fn get(&self, index: usize) -> Option<&SubmodelElement> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SubmodelElement> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubmodelElement> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for ListItems {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type
            && self.value_type == other.value_type
            && self.items == other.items
    }
}

/// The three variable groups of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableGroup {
    Input,
    Output,
    InOutput,
}

impl VariableGroup {
    pub const ALL: [Self; 3] = [Self::Input, Self::Output, Self::InOutput];
}

/// Operation variables. Order within a group is significant; id-shorts are
/// unique across all groups.
#[derive(Clone, Debug)]
pub struct OperationVariables {
    owner: NodeId,
    input: Vec<SubmodelElement>,
    output: Vec<SubmodelElement>,
    inoutput: Vec<SubmodelElement>,
}

impl OperationVariables {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self {
            owner,
            input: Vec::new(),
            output: Vec::new(),
            inoutput: Vec::new(),
        }
    }

    fn group_mut(&mut self, group: VariableGroup) -> &mut Vec<SubmodelElement> {
        match group {
            VariableGroup::Input => &mut self.input,
            VariableGroup::Output => &mut self.output,
            VariableGroup::InOutput => &mut self.inoutput,
        }
    }

    pub fn group(&self, group: VariableGroup) -> &[SubmodelElement] {
        match group {
            VariableGroup::Input => &self.input,
            VariableGroup::Output => &self.output,
            VariableGroup::InOutput => &self.inoutput,
        }
    }

    /// Find a variable in any group.
    pub fn find(&self, id_short: &str) -> Option<(VariableGroup, &SubmodelElement)> {
        VariableGroup::ALL.into_iter().find_map(|g| {
            self.group(g)
                .iter()
                .find(|v| v.id_short() == Some(id_short))
                .map(|v| (g, v))
        })
    }

    pub fn add(&mut self, group: VariableGroup, mut element: SubmodelElement) -> Result<(), ModelError> {
        let Some(id_short) = element.id_short() else {
            return Err(ModelError::violation(
                Constraint::IdShortRequired,
                "operation variables need an id-short",
            ));
        };
        if self.find(id_short).is_some() {
            return Err(ModelError::violation(
                Constraint::IdShortUnique,
                format!("operation variable `{id_short}` is already declared"),
            ));
        }
        element.set_parent(Some(self.owner));
        self.group_mut(group).push(element);
        Ok(())
    }

    pub fn remove(&mut self, group: VariableGroup, id_short: &str) -> Option<SubmodelElement> {
        let vars = self.group_mut(group);
        let index = vars.iter().position(|v| v.id_short() == Some(id_short))?;
        let mut element = vars.remove(index);
        element.set_parent(None);
        Some(element)
    }

    /// All variables, inputs first.
    pub fn iter(&self) -> impl Iterator<Item = &SubmodelElement> {
        self.input.iter().chain(&self.output).chain(&self.inoutput)
    }
}

impl PartialEq for OperationVariables {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input && self.output == other.output && self.inoutput == other.inoutput
    }
}
