//! `org/tessera/polyglot/Interop` substitutions, one per [`Message`]

use crate::interop::Message;
use crate::meta::names;
use crate::substitution::{RegistryError, StaticTableBuilder, SubstitutionFactory};

pub(super) fn register(builder: &mut StaticTableBuilder) -> Result<(), RegistryError> {
    let class = names().interop.as_str();
    for &message in Message::ALL {
        builder.register(
            SubstitutionFactory::builder(class, message.name())
                .parameters(message.parameters())
                .returns(message.return_type())
                .body(move |ctx, args| message.invoke(ctx, args)),
        )?;
    }
    Ok(())
}
