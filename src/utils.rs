
/**
    implement [packbytes::FromBytes] and [packbytes::ToBytes] for a byte-sized type stored on two wire bytes, each carrying 4 significant bits

    the type must convert from and to `u8`. Big endian puts the high nibble first, as the eeprom does.
*/
#[macro_export]
macro_rules! pack_nibbles {
    ($t:ty) => {

        impl packbytes::ToBytes for $t {
            type Bytes = [u8; 2];

            fn to_le_bytes(self) -> Self::Bytes {
                let [high, low] = <$t as packbytes::ToBytes>::to_be_bytes(self);
                [low, high]
            }
            fn to_be_bytes(self) -> Self::Bytes {
                let byte = u8::from(self);
                [byte >> 4, byte & 0x0f]
            }
        }
        impl packbytes::FromBytes for $t {
            type Bytes = [u8; 2];

            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                <$t as packbytes::FromBytes>::from_be_bytes([bytes[1], bytes[0]])
            }
            fn from_be_bytes(bytes: Self::Bytes) -> Self {
                <$t>::from($crate::registers::combine(bytes[0], bytes[1]))
            }
        }
    };
}
