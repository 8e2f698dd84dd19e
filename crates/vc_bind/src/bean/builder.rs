use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::bean::{
    BeanDecoder, BeanEncoder, CreatorArg, CreatorResolver, CreatorStrategy, Creators,
    DelegateWriter, PropertyDescriptor, PropertyWriter, ScalarCreatorKind,
};
use crate::codec::LinkedCodec;
use crate::error::{BindError, ErrorKind};
use crate::hash::{HashMap, HashSet};
use crate::introspect::{AccessorKind, ClassModel, Introspector, PropertyCandidate};
use crate::types::{ScalarKind, TypeDescriptor};

const MESSAGE: &str = "message";
const LOCALIZED_MESSAGE: &str = "localizedMessage";

/// Keeps one candidate per name, the one with the lowest rank.
///
/// Two candidates of the same rank claiming one name are an error.
fn merge_candidates(
    ty: &TypeDescriptor,
    candidates: Vec<PropertyCandidate>,
    rank: impl Fn(AccessorKind) -> Option<u8>,
) -> Result<Vec<PropertyCandidate>, BindError> {
    let mut merged: Vec<(u8, PropertyCandidate)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(candidate_rank) = rank(candidate.accessor()) else {
            continue;
        };
        match merged.iter_mut().find(|(_, kept)| kept.name() == candidate.name()) {
            None => merged.push((candidate_rank, candidate)),
            Some((kept_rank, kept)) => {
                if *kept_rank == candidate_rank {
                    return Err(BindError::invalid_definition(
                        ty,
                        format!(
                            "property `{}` is claimed by two {} accessors",
                            candidate.name(),
                            candidate.accessor().as_str()
                        ),
                    ));
                }
                if candidate_rank < *kept_rank {
                    *kept_rank = candidate_rank;
                    *kept = candidate;
                }
            }
        }
    }
    Ok(merged.into_iter().map(|(_, candidate)| candidate).collect())
}

/// Builds the decoder and encoder shells of a bean type.
///
/// Shells hold the property tables but no nested codecs: those are
/// resolved when the provider links the shell, after publishing it.
///
/// # Examples
///
/// ```
/// use vc_bind::bean::BeanCodecBuilder;
/// use vc_bind::introspect::{BindModel, ClassModel, ClassRegistry};
/// use vc_bind::types::TypeDescriptor;
/// use vc_bind::Typed;
///
/// #[derive(Clone, Debug, Default)]
/// struct Node { label: String, next: Option<Box<Node>> }
///
/// impl Typed for Node {
///     fn type_descriptor() -> TypeDescriptor {
///         TypeDescriptor::bean("Node")
///     }
/// }
///
/// let mut registry = ClassRegistry::new();
/// registry.insert(BindModel::Class(
///     ClassModel::builder::<Node>()
///         .default_creator(Node::default)
///         .field("label", |n: &Node| &n.label, |n: &mut Node, v| n.label = v)
///         .build(),
/// ));
///
/// let ty = Node::type_descriptor();
/// let builder = BeanCodecBuilder::new(&ty, &registry);
/// let decoder = builder.build_decoder().unwrap();
/// assert_eq!(decoder.properties()[0].name(), "label");
/// assert_eq!(builder.build_encoder().unwrap().writers().len(), 1);
/// ```
pub struct BeanCodecBuilder<'a> {
    ty: &'a TypeDescriptor,
    introspector: &'a dyn Introspector,
    model: Option<Arc<ClassModel>>,
}

impl<'a> BeanCodecBuilder<'a> {
    pub fn new(ty: &'a TypeDescriptor, introspector: &'a dyn Introspector) -> Self {
        Self {
            ty,
            introspector,
            model: introspector.find_class(ty),
        }
    }

    fn is_throwable(&self) -> bool {
        self.model.as_ref().is_some_and(|model| model.is_throwable())
    }

    /// Exception-shaped types take their message through the creator only,
    /// as soon as it appears.
    fn route_message(&self, creators: &mut Creators) {
        if matches!(
            creators.primary(),
            CreatorStrategy::Delegating { .. } | CreatorStrategy::PropertyBased { .. }
        ) {
            return;
        }
        let Some((_, creator)) = creators
            .scalars()
            .iter()
            .find(|(kind, _)| *kind == ScalarCreatorKind::String)
        else {
            return;
        };
        let strategy = CreatorStrategy::PropertyBased {
            args: vec![CreatorArg {
                name: String::from(MESSAGE),
                descriptor: TypeDescriptor::scalar(ScalarKind::String),
            }],
            creator: creator.clone(),
        };
        creators.replace_primary(strategy);
    }

    /// Resolves the creators of the type.
    pub fn creators(&self) -> Result<Creators, BindError> {
        let Some(candidates) = self.introspector.find_creators(self.ty) else {
            return Err(ErrorKind::NoCodecFound { ty: self.ty.clone() }.into());
        };
        let mut creators = CreatorResolver::new(self.ty).resolve(&candidates)?;
        if self.is_throwable() {
            self.route_message(&mut creators);
        }
        Ok(creators)
    }

    fn settable(&self) -> Result<Vec<PropertyCandidate>, BindError> {
        let mut settable = merge_candidates(
            self.ty,
            self.introspector.find_settable_members(self.ty),
            AccessorKind::settable_rank,
        )?;
        if let Some(candidate) = settable.iter().find(|candidate| {
            candidate.accessor() == AccessorKind::MergeGetter && !candidate.descriptor().is_container()
        }) {
            return Err(BindError::invalid_definition(
                self.ty,
                format!(
                    "merge-getter `{}` must return a container, not `{}`",
                    candidate.name(),
                    candidate.descriptor()
                ),
            ));
        }
        if self.is_throwable() {
            settable.retain(|candidate| candidate.name() != MESSAGE);
        }
        Ok(settable)
    }

    pub fn build_decoder(&self) -> Result<BeanDecoder, BindError> {
        let creators = self.creators()?;
        let mut properties = Vec::new();
        let mut creator_args = Vec::new();

        if let CreatorStrategy::PropertyBased { args, .. } = creators.primary() {
            for (index, arg) in args.iter().enumerate() {
                creator_args.push(properties.len());
                properties.push(PropertyDescriptor::creator_argument(
                    arg.name.clone(),
                    arg.descriptor.clone(),
                    index,
                ));
            }
        }

        for candidate in self.settable()? {
            let Some(setter) = candidate.setter() else {
                continue;
            };
            // Creator arguments take precedence over members of the same name.
            if properties.iter().any(|p: &PropertyDescriptor| p.name() == candidate.name()) {
                continue;
            }
            properties.push(PropertyDescriptor::settable(
                candidate.name(),
                candidate.descriptor().clone(),
                candidate.accessor(),
                setter.clone(),
            ));
        }

        let properties: Vec<_> = properties
            .into_iter()
            .map(|property| {
                match self
                    .introspector
                    .find_codec_override(self.ty, property.name())
                    .decoder
                {
                    Some(decoder) => property.with_decoder(decoder),
                    None => property,
                }
            })
            .collect();

        let by_name: HashMap<String, usize> = properties
            .iter()
            .enumerate()
            .map(|(index, property)| (String::from(property.name()), index))
            .collect();

        let mut ignored: HashSet<String> = HashSet::default();
        let mut any_setter = None;
        let mut ignore_unknown = false;
        if let Some(model) = &self.model {
            ignored.extend(model.ignored().iter().cloned());
            any_setter = model.any_setter().cloned();
            ignore_unknown = model.ignores_unknown();
        }
        if self.is_throwable() {
            ignored.insert(String::from(LOCALIZED_MESSAGE));
        }

        let delegate = match creators.primary() {
            CreatorStrategy::Delegating { intermediate, .. } => {
                Some(LinkedCodec::new(intermediate.clone()))
            }
            _ => None,
        };

        Ok(BeanDecoder {
            descriptor: self.ty.clone(),
            creators,
            properties,
            by_name,
            creator_args,
            any_setter,
            any_value: LinkedCodec::new(TypeDescriptor::any()),
            ignored,
            ignore_unknown,
            delegate,
        })
    }

    pub fn build_encoder(&self) -> Result<BeanEncoder, BindError> {
        if let Some((ty, getter)) = self.model.as_ref().and_then(|model| model.value_getter()) {
            return Ok(BeanEncoder {
                descriptor: self.ty.clone(),
                writers: Vec::new(),
                delegate: Some(DelegateWriter::new(ty.clone(), getter.clone())),
            });
        }

        let readable = merge_candidates(
            self.ty,
            self.introspector.find_readable_members(self.ty),
            AccessorKind::readable_rank,
        )?;
        let throwable = self.is_throwable();

        let writers = readable
            .into_iter()
            .filter(|candidate| !(throwable && candidate.name() == LOCALIZED_MESSAGE))
            .filter_map(|candidate| {
                let getter = candidate.getter()?.clone();
                let writer =
                    PropertyWriter::new(candidate.name(), candidate.descriptor().clone(), getter)
                        .with_inclusion(candidate.inclusion());
                Some(
                    match self
                        .introspector
                        .find_codec_override(self.ty, candidate.name())
                        .encoder
                    {
                        Some(encoder) => writer.with_encoder(encoder),
                        None => writer,
                    },
                )
            })
            .collect();

        Ok(BeanEncoder {
            descriptor: self.ty.clone(),
            writers,
            delegate: None,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{BindModel, ClassRegistry, CreatorSpec};
    use crate::value::Typed;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Basket {
        owner: String,
        items: Vec<String>,
        total: i64,
    }

    impl Typed for Basket {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Basket")
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Failure {
        message: String,
        code: i32,
    }

    impl Typed for Failure {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Failure")
        }
    }

    fn registry(model: ClassModel) -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Class(model));
        registry
    }

    #[test]
    fn settable_precedence() {
        let registry = registry(
            ClassModel::builder::<Basket>()
                .default_creator(Basket::default)
                .merge_getter("items", |b: &mut Basket| &mut b.items)
                .field("items", |b: &Basket| &b.items, |b: &mut Basket, v| b.items = v)
                .field("total", |b: &Basket| &b.total, |b: &mut Basket, v| b.total = v)
                .setter("total", |b: &mut Basket, v: i64| b.total = v * 100)
                .build(),
        );
        let ty = Basket::type_descriptor();
        let decoder = BeanCodecBuilder::new(&ty, &registry).build_decoder().unwrap();

        let accessors: Vec<_> = decoder
            .properties()
            .iter()
            .map(|p| (p.name(), p.accessor()))
            .collect();
        assert_eq!(
            accessors,
            [("items", AccessorKind::Field), ("total", AccessorKind::Setter)]
        );
    }

    #[test]
    fn duplicate_accessors_are_invalid() {
        let registry = registry(
            ClassModel::builder::<Basket>()
                .default_creator(Basket::default)
                .setter("owner", |b: &mut Basket, v: String| b.owner = v)
                .setter("owner", |b: &mut Basket, v: String| b.owner = v)
                .build(),
        );
        let ty = Basket::type_descriptor();
        let err = BeanCodecBuilder::new(&ty, &registry).build_decoder().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidDefinition { .. }));
    }

    /// Adds a merge-getter on a scalar, which the class model builder cannot express.
    struct ScalarMerge(ClassRegistry);

    impl Introspector for ScalarMerge {
        fn find_class(&self, ty: &TypeDescriptor) -> Option<Arc<ClassModel>> {
            self.0.find_class(ty)
        }

        fn find_enum(&self, ty: &TypeDescriptor) -> Option<Arc<crate::introspect::EnumModel>> {
            self.0.find_enum(ty)
        }

        fn find_abstract(
            &self,
            ty: &TypeDescriptor,
        ) -> Option<Arc<crate::introspect::AbstractModel>> {
            self.0.find_abstract(ty)
        }

        fn find_by_name(&self, name: &str) -> Option<TypeDescriptor> {
            self.0.find_by_name(name)
        }

        fn find_settable_members(&self, _ty: &TypeDescriptor) -> Vec<PropertyCandidate> {
            vec![PropertyCandidate::settable(
                "owner",
                String::type_descriptor(),
                AccessorKind::MergeGetter,
                Arc::new(|_, _| Ok(())),
            )]
        }
    }

    #[test]
    fn merge_getter_needs_a_container() {
        let introspector = ScalarMerge(registry(
            ClassModel::builder::<Basket>()
                .default_creator(Basket::default)
                .build(),
        ));
        let ty = Basket::type_descriptor();
        let err = BeanCodecBuilder::new(&ty, &introspector).build_decoder().unwrap_err();
        assert!(err.is_definition_error());
    }

    #[test]
    fn unknown_types_have_no_codec() {
        let registry = ClassRegistry::new();
        let ty = TypeDescriptor::bean("Ghost");
        let err = BeanCodecBuilder::new(&ty, &registry).build_decoder().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NoCodecFound { .. }));
    }

    #[test]
    fn creator_arguments_shadow_members() {
        let registry = registry(
            ClassModel::builder::<Basket>()
                .creator(
                    CreatorSpec::new("Basket::new").param::<String>("owner").param::<i64>("total"),
                    |args| {
                        Ok(Basket {
                            owner: args.take(0)?,
                            total: args.take(1)?,
                            ..Basket::default()
                        })
                    },
                )
                .field("owner", |b: &Basket| &b.owner, |b: &mut Basket, v| b.owner = v)
                .field("items", |b: &Basket| &b.items, |b: &mut Basket, v| b.items = v)
                .build(),
        );
        let ty = Basket::type_descriptor();
        let decoder = BeanCodecBuilder::new(&ty, &registry).build_decoder().unwrap();
        let owner = decoder.property("owner").unwrap();
        assert_eq!(owner.creator_index(), Some(0));
        assert_eq!(decoder.property("total").unwrap().creator_index(), Some(1));
        assert_eq!(decoder.property("items").unwrap().creator_index(), None);
    }

    #[test]
    fn value_getter_replaces_the_writers() {
        let registry = registry(
            ClassModel::builder::<Basket>()
                .default_creator(Basket::default)
                .field("owner", |b: &Basket| &b.owner, |b: &mut Basket, v| b.owner = v)
                .value_getter(|b: &Basket| b.items.clone())
                .build(),
        );
        let ty = Basket::type_descriptor();
        let encoder = BeanCodecBuilder::new(&ty, &registry).build_encoder().unwrap();
        assert!(encoder.writers().is_empty());
        assert_eq!(
            encoder.delegate().unwrap().descriptor(),
            &Vec::<String>::type_descriptor()
        );
    }

    #[test]
    fn throwable_message_goes_through_the_creator() {
        let registry = registry(
            ClassModel::builder::<Failure>()
                .default_creator(Failure::default)
                .creator(CreatorSpec::new("Failure::new").arg::<String>(), |args| {
                    Ok(Failure {
                        message: args.take(0)?,
                        code: 0,
                    })
                })
                .field("message", |f: &Failure| &f.message, |f: &mut Failure, v| f.message = v)
                .field("code", |f: &Failure| &f.code, |f: &mut Failure, v| f.code = v)
                .throwable()
                .build(),
        );
        let ty = Failure::type_descriptor();
        let builder = BeanCodecBuilder::new(&ty, &registry);
        let decoder = builder.build_decoder().unwrap();

        assert!(matches!(
            decoder.creators().primary(),
            CreatorStrategy::PropertyBased { args, .. } if args[0].name == MESSAGE
        ));
        assert_eq!(decoder.property(MESSAGE).unwrap().accessor(), AccessorKind::CreatorArgument);
        assert!(decoder.ignored.contains(LOCALIZED_MESSAGE));
        assert_eq!(builder.build_encoder().unwrap().writers().len(), 2);
    }
}
