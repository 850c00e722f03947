//! `java/lang/System` substitutions

use crate::context::InteropContext;
use crate::exception::Thrown;
use crate::interop::message::Args;
use crate::meta::names;
use crate::object::{ArrayData, GuestRef, GuestValue, NativeData};
use crate::substitution::{RegistryError, StaticTableBuilder, SubstitutionFactory};

const SYSTEM: &str = "java/lang/System";
const OBJECT: &str = "Ljava/lang/Object;";

pub(super) fn register(builder: &mut StaticTableBuilder) -> Result<(), RegistryError> {
    builder.register(
        SubstitutionFactory::builder(SYSTEM, "arraycopy")
            .parameters(&[OBJECT, "I", OBJECT, "I", "I"])
            .returns("V")
            .body(arraycopy),
    )?;
    builder.register(
        SubstitutionFactory::builder(SYSTEM, "identityHashCode")
            .parameters(&[OBJECT])
            .returns("I")
            .body(identity_hash_code),
    )?;
    Ok(())
}

fn array<'a>(ctx: &InteropContext, r: &'a GuestRef, role: &str) -> Result<&'a ArrayData, Thrown> {
    if r.is_null() {
        return Err(ctx.meta().throw(names().null_pointer, format!("{} array is null", role)));
    }
    match r.native_data() {
        Some(NativeData::Array(a)) => Ok(a),
        _ => Err(ctx
            .meta()
            .throw(names().array_store, format!("arraycopy: {} type is not an array", role))),
    }
}

fn is_primitive(component: &str) -> bool {
    component.len() == 1
}

/// `System.arraycopy(src, srcPos, dest, destPos, length)`
fn arraycopy(ctx: &InteropContext, args: &[GuestValue]) -> Result<GuestValue, Thrown> {
    let a = Args::new(ctx, args);
    let (src_ref, dest_ref) = (a.object(0)?, a.object(2)?);
    let (src_pos, dest_pos, length) = (a.int(1)?, a.int(3)?, a.int(4)?);

    let src = array(ctx, &src_ref, "source")?;
    let dest = array(ctx, &dest_ref, "destination")?;

    let (sc, dc) = (src.component().as_str(), dest.component().as_str());
    if (is_primitive(sc) || is_primitive(dc)) && sc != dc {
        return Err(ctx.meta().throw(
            names().array_store,
            format!("arraycopy: type mismatch: can not copy {}[] into {}[]", sc, dc),
        ));
    }

    let out_of_bounds = |what: String| Err(ctx.meta().throw(names().array_index_out_of_bounds, what));
    if length < 0 {
        return out_of_bounds(format!("arraycopy: length {} is negative", length));
    }
    if src_pos < 0 || src_pos as i64 + length as i64 > src.len() as i64 {
        return out_of_bounds(format!(
            "arraycopy: last source index {} out of bounds for length {}",
            src_pos as i64 + length as i64,
            src.len()
        ));
    }
    if dest_pos < 0 || dest_pos as i64 + length as i64 > dest.len() as i64 {
        return out_of_bounds(format!(
            "arraycopy: last destination index {} out of bounds for length {}",
            dest_pos as i64 + length as i64,
            dest.len()
        ));
    }

    let (s, d, n) = (src_pos as usize, dest_pos as usize, length as usize);
    // Snapshot first: no two array locks are held at once, and overlapping
    // ranges copy as if through a temporary
    let copied: Vec<GuestValue> = src.elements().read()[s..s + n].to_vec();
    dest.elements().write()[d..d + n].clone_from_slice(&copied);
    Ok(GuestValue::Void)
}

/// `System.identityHashCode(obj)`
fn identity_hash_code(ctx: &InteropContext, args: &[GuestValue]) -> Result<GuestValue, Thrown> {
    let obj = Args::new(ctx, args).object(0)?;
    Ok(GuestValue::Int(obj.identity_hash()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(ctx: &InteropContext, values: &[i32]) -> GuestRef {
        ctx.meta().new_array("I", values.iter().map(|&v| GuestValue::Int(v)).collect())
    }

    fn contents(r: &GuestRef) -> Vec<i32> {
        let Some(NativeData::Array(a)) = r.native_data() else {
            panic!("not an array");
        };
        a.elements().read().iter().filter_map(GuestValue::as_int).collect()
    }

    fn call(ctx: &InteropContext, src: &GuestRef, sp: i32, dest: &GuestRef, dp: i32, n: i32) -> Result<GuestValue, Thrown> {
        arraycopy(
            ctx,
            &[
                src.clone().into(),
                GuestValue::Int(sp),
                dest.clone().into(),
                GuestValue::Int(dp),
                GuestValue::Int(n),
            ],
        )
    }

    fn thrown_class(result: Result<GuestValue, Thrown>) -> Option<crate::symbol::Symbol> {
        match result {
            Err(Thrown::Guest(exc)) => exc.klass(),
            _ => None,
        }
    }

    #[test]
    fn test_arraycopy_between_arrays() {
        let ctx = InteropContext::new();
        let src = ints(&ctx, &[1, 2, 3, 4]);
        let dest = ints(&ctx, &[0, 0, 0, 0]);
        call(&ctx, &src, 1, &dest, 0, 3).unwrap();
        assert_eq!(contents(&dest), vec![2, 3, 4, 0]);
    }

    #[test]
    fn test_arraycopy_overlapping() {
        let ctx = InteropContext::new();
        let a = ints(&ctx, &[1, 2, 3, 4, 5]);
        call(&ctx, &a, 0, &a, 1, 4).unwrap();
        assert_eq!(contents(&a), vec![1, 1, 2, 3, 4]);
    }

    #[test]
    fn test_arraycopy_failures() {
        let ctx = InteropContext::new();
        let a = ints(&ctx, &[1, 2]);
        let bytes = ctx.meta().new_array("B", vec![GuestValue::Byte(0)]);
        let n = names();

        assert_eq!(thrown_class(call(&ctx, &GuestRef::NULL, 0, &a, 0, 1)), Some(n.null_pointer));
        assert_eq!(thrown_class(call(&ctx, &a, 0, &bytes, 0, 1)), Some(n.array_store));
        assert_eq!(thrown_class(call(&ctx, &a, 1, &a, 0, 2)), Some(n.array_index_out_of_bounds));
        assert_eq!(thrown_class(call(&ctx, &a, 0, &a, 0, -1)), Some(n.array_index_out_of_bounds));
        assert_eq!(contents(&a), vec![1, 2]);
    }

    #[test]
    fn test_identity_hash_code() {
        let ctx = InteropContext::new();
        let s = ctx.meta().to_guest_string("x");
        let hash = identity_hash_code(&ctx, &[s.clone().into()]).unwrap();
        assert_eq!(hash.as_int(), Some(s.identity_hash()));
        let null = identity_hash_code(&ctx, &[GuestValue::null()]).unwrap();
        assert_eq!(null.as_int(), Some(0));
    }

    #[test]
    fn test_malformed_arguments_are_illegal() {
        let ctx = InteropContext::new();
        let a = ints(&ctx, &[1, 2]);
        let n = names();

        assert_eq!(thrown_class(identity_hash_code(&ctx, &[])), Some(n.illegal_argument));
        assert_eq!(
            thrown_class(identity_hash_code(&ctx, &[GuestValue::Int(1)])),
            Some(n.illegal_argument)
        );

        // a reference where srcPos belongs
        let wrong = arraycopy(
            &ctx,
            &[a.clone().into(), a.clone().into(), a.clone().into(), GuestValue::Int(0), GuestValue::Int(1)],
        );
        assert_eq!(thrown_class(wrong), Some(n.illegal_argument));
        let short = arraycopy(&ctx, &[a.clone().into(), GuestValue::Int(0), a.clone().into()]);
        assert_eq!(thrown_class(short), Some(n.illegal_argument));
        assert_eq!(contents(&a), vec![1, 2]);
    }
}
