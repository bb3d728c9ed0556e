use guest_heap::objects::SlotValue;
use guest_heap::{
    AllocationChecks, AllocationError, AllocatorConfig, ClassBuilder, ClassDescriptor, CountingTracker,
    GuestAllocator, Meta, ObjectHandle, PrimitiveKind, SlotSpec, Specialization,
};
use proptest::prelude::*;
use std::sync::Arc;

fn allocator(config: AllocatorConfig) -> (Arc<Meta>, Arc<CountingTracker>, GuestAllocator) {
    let meta = Meta::bootstrap();
    let tracker = Arc::new(CountingTracker::new());
    let allocator = GuestAllocator::new(Arc::clone(&meta), tracker.clone(), config);
    (meta, tracker, allocator)
}

#[derive(Debug, Clone)]
enum FieldShape {
    Primitive(u8),
    Reference,
    Hidden,
    Removed,
}

fn field_shape() -> impl Strategy<Value = FieldShape> {
    prop_oneof![
        (4u8..=11).prop_map(FieldShape::Primitive),
        Just(FieldShape::Reference),
        Just(FieldShape::Hidden),
        Just(FieldShape::Removed),
    ]
}

fn build_class(fields: &[FieldShape]) -> Arc<ClassDescriptor> {
    fields
        .iter()
        .enumerate()
        .fold(ClassBuilder::new("Generated"), |builder, (i, field)| {
            let name = format!("f{i}");
            let spec = match field {
                FieldShape::Primitive(code) => {
                    SlotSpec::primitive(name, PrimitiveKind::from_type_code(*code).unwrap())
                }
                FieldShape::Reference => SlotSpec::reference(name),
                FieldShape::Hidden => SlotSpec::reference(name).hidden(),
                FieldShape::Removed => SlotSpec::reference(name).removed(),
            };
            builder.field(spec.clone()).static_field(spec)
        })
        .build()
}

fn reference_states(object: &ObjectHandle, class: &ClassDescriptor, statics: bool) -> Vec<bool> {
    let shape = if statics { class.static_shape() } else { class.instance_shape() };
    let fields = object.fields().unwrap();
    shape
        .slots()
        .iter()
        .filter(|slot| slot.is_reference() && !slot.is_removed())
        .map(|slot| fields.reference(slot).is_guest_null())
        .collect()
}

proptest! {
    // ===== Field Initialization Properties =====

    #[test]
    fn visible_references_null_primitives_zero(fields in prop::collection::vec(field_shape(), 0..24)) {
        let (_, _, allocator) = allocator(AllocatorConfig::default());
        let class = build_class(&fields);
        let object = allocator.create_instance(&class);
        let storage = object.fields().unwrap();

        for slot in class.instance_shape().slots() {
            if slot.is_removed() {
                continue;
            }
            if !slot.is_reference() {
                prop_assert_eq!(storage.read_primitive(slot), 0);
            } else if slot.is_hidden() {
                prop_assert!(matches!(storage.reference(slot), SlotValue::Unset));
            } else {
                prop_assert!(storage.reference(slot).is_guest_null());
            }
        }
    }

    #[test]
    fn statics_null_every_live_reference(fields in prop::collection::vec(field_shape(), 0..24)) {
        let (_, _, allocator) = allocator(AllocatorConfig::default());
        let class = build_class(&fields);
        let statics = allocator.create_statics(&class);
        prop_assert!(reference_states(&statics, &class, true).iter().all(|&null| null));
    }

    #[test]
    fn specializations_are_equivalent(fields in prop::collection::vec(field_shape(), 0..24)) {
        let (_, _, allocator) = allocator(AllocatorConfig::default());
        let class = build_class(&fields);
        let unrolled = allocator.create_instance_specialized(&class, Specialization::Unrolled);
        let generic = allocator.create_instance_specialized(&class, Specialization::Generic);
        prop_assert_eq!(
            reference_states(&unrolled, &class, false),
            reference_states(&generic, &class, false)
        );
    }

    // ===== Array Properties =====

    #[test]
    fn primitive_arrays_have_requested_length(code in 4u8..=11, length in 0i32..512) {
        let (_, tracker, allocator) = allocator(AllocatorConfig::default());
        let kind = PrimitiveKind::from_type_code(code).unwrap();
        let array = allocator.create_primitive_array(kind, length);
        let storage = array.array().unwrap();
        prop_assert_eq!(storage.len(), length as usize);
        prop_assert!((0..storage.len()).all(|i| storage.primitive_bits(i) == Some(0)));
        prop_assert_eq!(tracker.stats().total, 1);
    }

    #[test]
    fn multi_array_tracks_every_level(dims in prop::collection::vec(0i32..4, 1..4)) {
        let (meta, tracker, allocator) = allocator(AllocatorConfig::default());
        let mut component = Arc::clone(meta.primitive(PrimitiveKind::Short));
        for _ in 1..dims.len() {
            component = component.array_class();
        }
        prop_assume!(AllocationChecks::can_allocate_multi_array(&component, &dims));
        let array = allocator.create_multi_array(&component, &dims);

        // one object per array at every level: 1 + d0 + d0*d1 + ...
        let mut expected = 0usize;
        let mut width = 1usize;
        for &dim in &dims {
            expected += width;
            width *= dim as usize;
        }
        prop_assert_eq!(tracker.stats().total, expected);
        prop_assert_eq!(array.class().unwrap().dimensions(), dims.len());
        prop_assert_eq!(array.array_length(), Some(dims[0] as usize));
    }

    #[test]
    fn negative_lengths_never_validate(length in i32::MIN..0) {
        prop_assert!(!AllocationChecks::can_allocate_array(length));
        prop_assert_eq!(
            AllocationChecks::check_array(length),
            Err(AllocationError::NegativeArrayLength { length })
        );
    }

    #[test]
    fn multi_array_reports_first_negative(prefix in prop::collection::vec(0i32..8, 0..4), bad in i32::MIN..0) {
        let (meta, _, _) = allocator(AllocatorConfig::default());
        let mut dims = prefix;
        dims.push(bad);
        dims.push(-1);
        prop_assert_eq!(
            AllocationChecks::check_multi_array(&meta.object, &dims),
            Err(AllocationError::NegativeArrayLength { length: bad })
        );
    }

    // ===== Copy Properties =====

    #[test]
    fn copies_are_fresh_and_equal(values in prop::collection::vec(any::<i64>(), 0..64)) {
        let (meta, tracker, allocator) = allocator(AllocatorConfig::default());
        let class = meta.primitive(PrimitiveKind::Long).array_class();
        let original = allocator.wrap_array(&class, values.clone().into());
        let copy = allocator.copy(&original).unwrap();

        prop_assert!(!copy.ptr_eq(&original));
        prop_assert!(!copy.array().unwrap().shares_buffer(original.array().unwrap()));
        let bits: Vec<u64> = (0..values.len()).filter_map(|i| copy.array().unwrap().primitive_bits(i)).collect();
        let expected: Vec<u64> = values.iter().map(|&v| v as u64).collect();
        prop_assert_eq!(bits, expected);
        prop_assert_eq!(tracker.stats().total, 2);
    }
}

#[test]
fn generic_only_config_matches_default() {
    let fields = vec![FieldShape::Reference, FieldShape::Hidden, FieldShape::Primitive(7), FieldShape::Reference];
    let class = build_class(&fields);
    let (_, _, unrolled) = allocator(AllocatorConfig::default());
    let (_, _, generic) = allocator(AllocatorConfig::generic_only());
    assert_eq!(
        reference_states(&unrolled.create_instance(&class), &class, false),
        reference_states(&generic.create_instance(&class), &class, false)
    );
}
