/// Implements `Write`, `Read` and `FixedSize` for a fieldless `#[repr(u8)]`
/// enum, encoding it as its discriminant.
macro_rules! u8_enum_codec {
    ($ty:ident { $($value:literal => $variant:ident),+ $(,)? }) => {
        impl commonware_codec::Write for $ty {
            fn write(&self, writer: &mut impl bytes::BufMut) {
                commonware_codec::Write::write(&(*self as u8), writer);
            }
        }

        impl commonware_codec::Read for $ty {
            type Cfg = ();

            fn read_cfg(
                reader: &mut impl bytes::Buf,
                _: &Self::Cfg,
            ) -> Result<Self, commonware_codec::Error> {
                match <u8 as commonware_codec::ReadExt>::read(reader)? {
                    $($value => Ok(Self::$variant),)+
                    i => Err(commonware_codec::Error::InvalidEnum(i)),
                }
            }
        }

        impl commonware_codec::FixedSize for $ty {
            const SIZE: usize = 1;
        }
    };
}
